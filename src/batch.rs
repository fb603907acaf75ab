//! The batch merge workflow
//!
//! Pick a target branch, pick the branches to merge into it, then for each
//! source: check it out, pull, check out the target and merge. The first step
//! that exits non-zero ends the whole batch; merges already made stay in place.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, BufRead, Write};

use log::info;
use thiserror::Error;

use crate::git::{CommandError, CommandOutput, CommandRunner, ExitStatus, GitDriver, local_name};
use crate::prefs::Preferences;
use crate::select::{Console, PromptError, select_branch, select_branches};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{step} of `{branch}` failed with {status}")]
    StepFailed {
        step: Step,
        branch: String,
        status: ExitStatus,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// One git invocation in the per-source sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckoutSource,
    Pull,
    CheckoutTarget,
    Merge,
}

impl Step {
    fn heading(self, source: &str, target: &str) -> String {
        match self {
            Step::CheckoutSource => format!("--- Checking out source branch: {source} ---"),
            Step::Pull => format!("--- Pulling latest changes for {source} ---"),
            Step::CheckoutTarget => format!("--- Checking out target branch: {target} ---"),
            Step::Merge => format!("--- Merging branch {source} into {target} ---"),
        }
    }

    fn failure_message(self, source: &str, target: &str) -> String {
        match self {
            Step::CheckoutSource => format!("Failed to checkout branch {source}. Aborting."),
            Step::Pull => format!("Failed to pull latest changes for {source}. Aborting."),
            Step::CheckoutTarget => format!("Failed to checkout branch {target}. Aborting."),
            Step::Merge => format!(
                "Merge conflicts occurred while merging {source} into {target}. \
                 Please resolve them manually. Aborting."
            ),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::CheckoutSource => "checkout",
            Step::Pull => "pull",
            Step::CheckoutTarget => "checkout of target",
            Step::Merge => "merge",
        })
    }
}

/// Why a batch stopped before running any git step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    NoLocalBranches,
    NoTargetSelected,
    NoCandidates,
    NoSourcesSelected,
}

impl AbortReason {
    fn message(self) -> &'static str {
        match self {
            AbortReason::NoLocalBranches => {
                "No local branches found. Make sure you are in a git repository."
            }
            AbortReason::NoTargetSelected => "No local branch selected. Aborting.",
            AbortReason::NoCandidates => "No other branches available to merge.",
            AbortReason::NoSourcesSelected => "No source branches selected. Aborting.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every source was merged; `preferences` should be persisted
    Completed {
        target: String,
        sources: Vec<String>,
        preferences: Preferences,
    },
    Aborted(AbortReason),
}

/// Branches that can be merged into `target`: other local branches, then
/// remote-tracking ones, each listed once.
#[must_use]
pub fn source_candidates(local: &[String], target: &str, remote: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    local
        .iter()
        .filter(|branch| branch.as_str() != target)
        .chain(remote)
        .filter(|branch| seen.insert(branch.as_str()))
        .cloned()
        .collect()
}

fn abort<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    reason: AbortReason,
) -> Result<BatchOutcome, BatchError> {
    info!("Batch aborted: {reason:?}");
    writeln!(console, "{}", reason.message())?;
    Ok(BatchOutcome::Aborted(reason))
}

fn ensure_success<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    output: &CommandOutput,
    step: Step,
    branch: &str,
    target: &str,
) -> Result<(), BatchError> {
    if output.success() {
        return Ok(());
    }
    let sty = console.style();
    writeln!(console, "{}", sty.failure(&step.failure_message(branch, target)))?;
    Err(BatchError::StepFailed {
        step,
        branch: branch.to_string(),
        status: output.status,
    })
}

/// Merge one source into `target`; `branch` is the name `source` is checked
/// out by.
fn merge_source<R, I, O>(
    driver: &mut GitDriver<R>,
    console: &mut Console<I, O>,
    source: &str,
    branch: &str,
    target: &str,
) -> Result<(), BatchError>
where
    R: CommandRunner,
    I: BufRead,
    O: Write,
{
    let sty = console.style();
    writeln!(console)?;
    writeln!(
        console,
        "{}",
        sty.heading(&format!(">>> Processing source branch: {source} <<<"))
    )?;

    for step in [Step::CheckoutSource, Step::Pull, Step::CheckoutTarget, Step::Merge] {
        writeln!(console)?;
        writeln!(console, "{}", sty.heading(&step.heading(branch, target)))?;
        let output = match step {
            Step::CheckoutSource => driver.checkout(branch, console)?,
            Step::Pull => driver.pull(console)?,
            Step::CheckoutTarget => driver.checkout(target, console)?,
            Step::Merge => driver.merge(branch, console)?,
        };
        let failed_branch = if step == Step::CheckoutTarget { target } else { branch };
        ensure_success(console, &output, step, failed_branch, target)?;
    }
    info!("Merged {source} into {target}");
    Ok(())
}

/// Run one interactive batch.
///
/// `preferences` supplies the defaults offered at each prompt. On success the
/// returned outcome carries the preferences to persist; nothing is returned
/// for saving when the batch is aborted or fails.
///
/// # Errors
///
/// Returns `BatchError::StepFailed` when a checkout, pull or merge exits
/// non-zero, `BatchError::Command` when git cannot be run or a branch listing
/// fails, and `BatchError::Prompt` when input ends mid-prompt.
pub fn run<R, I, O>(
    driver: &mut GitDriver<R>,
    console: &mut Console<I, O>,
    preferences: &Preferences,
) -> Result<BatchOutcome, BatchError>
where
    R: CommandRunner,
    I: BufRead,
    O: Write,
{
    let local = driver.list_branches(false, console)?;
    if local.is_empty() {
        return abort(console, AbortReason::NoLocalBranches);
    }

    let Some(target) = select_branch(
        console,
        "local",
        &local,
        preferences.last_local_branch.as_deref(),
    )?
    else {
        return abort(console, AbortReason::NoTargetSelected);
    };

    let remote = driver.list_branches(true, console)?;
    let remotes = if remote.is_empty() {
        Vec::new()
    } else {
        driver.remotes(console)?
    };

    let candidates = source_candidates(&local, &target, &remote);
    if candidates.is_empty() {
        return abort(console, AbortReason::NoCandidates);
    }

    let sources = select_branches(
        console,
        "source (to merge from)",
        &candidates,
        preferences.last_merge_branches.as_deref(),
    )?;
    if sources.is_empty() {
        return abort(console, AbortReason::NoSourcesSelected);
    }
    info!("Merging {} into {target}", sources.join(", "));

    for source in &sources {
        let branch = if remote.contains(source) {
            local_name(source, &remotes)
        } else {
            source.as_str()
        };
        merge_source(driver, console, source, branch, &target)?;
    }

    let sty = console.style();
    writeln!(console)?;
    writeln!(console, "{}", sty.success("Batch operation completed."))?;

    Ok(BatchOutcome::Completed {
        preferences: Preferences::after_batch(&target, &sources),
        target,
        sources,
    })
}

//! Thin layer over the `git` binary
//!
//! Everything goes through [`CommandRunner`], which runs `git` with an argument
//! vector and hands back the exit status together with the captured output.
//! [`GitDriver`] builds the handful of commands the batch needs on top of it and
//! relays command output to the console.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};
use std::thread;

use log::debug;
use thiserror::Error;

/// Errors raised while running git
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("git repository not found: {0}")]
    NoRepo(#[from] git2::Error),

    #[error("repository at {0} has no working directory")]
    BareRepo(PathBuf),

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with {status}")]
    Failed { command: String, status: ExitStatus },

    #[error("failed to relay command output: {0}")]
    Relay(#[from] io::Error),
}

/// Exit code of a finished git process, `None` when it was killed by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(pub Option<i32>);

impl ExitStatus {
    #[must_use]
    pub fn success(self) -> bool {
        self.0 == Some(0)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("no exit code (terminated by signal)"),
        }
    }
}

/// Captured result of a finished git command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs `git` with the given arguments and waits for it to exit
pub trait CommandRunner {
    /// Run `git <args>`, returning once the process has exited and both output
    /// streams have been read to the end.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Spawn` if the process cannot be started.
    fn run(&mut self, args: &[&str]) -> Result<CommandOutput, CommandError>;

    /// Run `git <args>`, relaying stdout and then stderr to `out`.
    ///
    /// The default relays once the process has exited; runners that can
    /// stream should pass output on as it is produced.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Spawn` if the process cannot be started, or
    /// `CommandError::Relay` if output cannot be read or written.
    fn run_relayed(
        &mut self,
        args: &[&str],
        out: &mut dyn Write,
    ) -> Result<CommandOutput, CommandError> {
        let output = self.run(args)?;
        out.write_all(output.stdout.as_bytes())?;
        out.write_all(output.stderr.as_bytes())?;
        Ok(output)
    }
}

fn command_line(args: &[&str]) -> String {
    std::iter::once("git")
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs the real `git` binary inside a working directory
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cwd: PathBuf,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, args: &[&str]) -> Result<CommandOutput, CommandError> {
        debug!("Running '{}' in {}", command_line(args), self.cwd.display());
        let output = ProcessCommand::new("git")
            .args(args)
            .current_dir(&self.cwd)
            .output()
            .map_err(|e| CommandError::Spawn {
                command: command_line(args),
                source: e,
            })?;
        Ok(CommandOutput {
            status: ExitStatus(output.status.code()),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Streams stdout line by line while stderr is collected on a separate
    /// thread, then relays stderr once stdout closes.
    fn run_relayed(
        &mut self,
        args: &[&str],
        out: &mut dyn Write,
    ) -> Result<CommandOutput, CommandError> {
        let command = command_line(args);
        debug!("Running '{command}' in {}", self.cwd.display());
        let spawn_err = |source| CommandError::Spawn {
            command: command.clone(),
            source,
        };

        let mut child = ProcessCommand::new("git")
            .args(args)
            .current_dir(&self.cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).map(|_| buf)
            })
        });

        let mut stdout = Vec::new();
        if let Some(pipe) = child.stdout.take() {
            let mut reader = BufReader::new(pipe);
            let mut line = Vec::new();
            while reader.read_until(b'\n', &mut line)? > 0 {
                out.write_all(&line)?;
                out.flush()?;
                stdout.append(&mut line);
            }
        }

        let stderr = match stderr_reader {
            Some(handle) => handle
                .join()
                .map_err(|_| io::Error::other("stderr reader panicked"))??,
            None => Vec::new(),
        };
        out.write_all(&stderr)?;

        let status = child.wait().map_err(spawn_err)?;
        Ok(CommandOutput {
            status: ExitStatus(status.code()),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// Find the working directory of the repository containing `cwd`.
///
/// # Errors
///
/// Returns `CommandError::NoRepo` if no repository is found, or
/// `CommandError::BareRepo` if the repository has no working directory.
pub fn discover_work_dir(cwd: &Path) -> Result<PathBuf, CommandError> {
    let repo = git2::Repository::discover(cwd)?;
    let work_dir = repo
        .workdir()
        .ok_or_else(|| CommandError::BareRepo(repo.path().to_path_buf()))?
        .to_path_buf();
    debug!("Discovered git repo at {}", work_dir.display());
    Ok(work_dir)
}

/// Branch names from `git branch` output.
///
/// Drops the `* ` and `+ ` markers git puts in front of the current branch and
/// branches checked out in other worktrees, and skips symbolic references such
/// as `origin/HEAD -> origin/main`.
#[must_use]
pub fn parse_branch_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .map(|line| {
            line.strip_prefix("* ")
                .or_else(|| line.strip_prefix("+ "))
                .unwrap_or(line)
        })
        .filter(|line| !line.is_empty() && !line.contains("->"))
        .map(ToString::to_string)
        .collect()
}

/// The git operations a batch merge needs, with output relayed to the console
#[derive(Debug)]
pub struct GitDriver<R> {
    runner: R,
}

impl<R: CommandRunner> GitDriver<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Run a command whose stdout is data; stderr is only relayed on failure.
    fn query(&mut self, args: &[&str], out: &mut impl Write) -> Result<String, CommandError> {
        let output = self.runner.run(args)?;
        if !output.success() {
            out.write_all(output.stderr.as_bytes())?;
            return Err(CommandError::Failed {
                command: command_line(args),
                status: output.status,
            });
        }
        Ok(output.stdout)
    }

    /// Run a command and relay its stdout and stderr verbatim.
    fn execute(
        &mut self,
        args: &[&str],
        out: &mut impl Write,
    ) -> Result<CommandOutput, CommandError> {
        let output = self.runner.run_relayed(args, &mut *out)?;
        let command = command_line(args);
        match output.status.0 {
            Some(code) => writeln!(out, "Command '{command}' finished with exit code {code}")?,
            None => writeln!(out, "Command '{command}' was terminated by a signal")?,
        }
        debug!("'{command}' finished with {}", output.status);
        Ok(output)
    }

    /// List local branches, or remote-tracking branches when `remote` is set.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Failed` if git exits unsuccessfully.
    pub fn list_branches(
        &mut self,
        remote: bool,
        out: &mut impl Write,
    ) -> Result<Vec<String>, CommandError> {
        let args: &[&str] = if remote { &["branch", "-r"] } else { &["branch"] };
        let branches = parse_branch_listing(&self.query(args, out)?);
        debug!(
            "Found {} {} branches",
            branches.len(),
            if remote { "remote" } else { "local" }
        );
        Ok(branches)
    }

    /// Names of the configured remotes.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Failed` if git exits unsuccessfully.
    pub fn remotes(&mut self, out: &mut impl Write) -> Result<Vec<String>, CommandError> {
        Ok(self
            .query(&["remote"], out)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if git cannot be started or its output cannot be relayed.
    pub fn checkout(
        &mut self,
        branch: &str,
        out: &mut impl Write,
    ) -> Result<CommandOutput, CommandError> {
        self.execute(&["checkout", branch], out)
    }

    /// # Errors
    ///
    /// Returns an error if git cannot be started or its output cannot be relayed.
    pub fn pull(&mut self, out: &mut impl Write) -> Result<CommandOutput, CommandError> {
        self.execute(&["pull"], out)
    }

    /// # Errors
    ///
    /// Returns an error if git cannot be started or its output cannot be relayed.
    pub fn merge(
        &mut self,
        branch: &str,
        out: &mut impl Write,
    ) -> Result<CommandOutput, CommandError> {
        self.execute(&["merge", branch], out)
    }
}

/// Name to check out for a remote-tracking branch, e.g. `main` for `origin/main`.
///
/// Branches that do not start with one of `remotes` are returned unchanged.
#[must_use]
pub fn local_name<'a>(branch: &'a str, remotes: &[String]) -> &'a str {
    remotes
        .iter()
        .find_map(|remote| {
            branch
                .strip_prefix(remote.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
        })
        .filter(|rest| !rest.is_empty())
        .unwrap_or(branch)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Replays canned outputs and records the arguments it was called with
    #[derive(Default)]
    struct Scripted {
        outputs: VecDeque<CommandOutput>,
        calls: Vec<String>,
    }

    impl Scripted {
        fn respond(mut self, code: i32, stdout: &str, stderr: &str) -> Self {
            self.outputs.push_back(CommandOutput {
                status: ExitStatus(Some(code)),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            });
            self
        }
    }

    impl CommandRunner for Scripted {
        fn run(&mut self, args: &[&str]) -> Result<CommandOutput, CommandError> {
            self.calls.push(args.join(" "));
            Ok(self.outputs.pop_front().expect("unexpected git invocation"))
        }
    }

    #[test]
    fn test_parse_branch_listing_local() {
        let stdout = "  develop\n* main\n+ wt-branch\n  feature/x\n";
        assert_eq!(
            parse_branch_listing(stdout),
            vec!["develop", "main", "wt-branch", "feature/x"]
        );
    }

    #[test]
    fn test_parse_branch_listing_skips_symbolic_refs() {
        let stdout = "  origin/HEAD -> origin/main\n  origin/main\n  origin/feature/y\n\n";
        assert_eq!(
            parse_branch_listing(stdout),
            vec!["origin/main", "origin/feature/y"]
        );
    }

    #[test]
    fn test_list_branches_uses_remote_flag() {
        let mut driver = GitDriver::new(Scripted::default().respond(0, "  origin/main\n", ""));
        let mut out = Vec::new();
        let branches = driver.list_branches(true, &mut out).unwrap();
        assert_eq!(branches, vec!["origin/main"]);
        assert_eq!(driver.into_runner().calls, vec!["branch -r"]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_list_branches_failure_relays_stderr() {
        let mut driver = GitDriver::new(Scripted::default().respond(
            128,
            "",
            "fatal: not a git repository\n",
        ));
        let mut out = Vec::new();
        let err = driver.list_branches(false, &mut out).unwrap_err();
        assert_eq!(err.to_string(), "`git branch` failed with exit code 128");
        assert_eq!(String::from_utf8(out).unwrap(), "fatal: not a git repository\n");
    }

    #[test]
    fn test_execute_relays_output_and_exit_code() {
        let mut driver = GitDriver::new(Scripted::default().respond(
            1,
            "Auto-merging a.txt\n",
            "CONFLICT (content)\n",
        ));
        let mut out = Vec::new();
        let output = driver.merge("feature/x", &mut out).unwrap();
        assert!(!output.success());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Auto-merging a.txt\nCONFLICT (content)\n\
             Command 'git merge feature/x' finished with exit code 1\n"
        );
    }

    #[test]
    fn test_remotes() {
        let mut driver =
            GitDriver::new(Scripted::default().respond(0, "origin\nupstream\n", ""));
        let remotes = driver.remotes(&mut Vec::new()).unwrap();
        assert_eq!(remotes, vec!["origin", "upstream"]);
    }

    #[test]
    fn test_local_name_strips_known_remote() {
        let remotes = vec!["origin".to_string(), "up".to_string()];
        assert_eq!(local_name("origin/feature/x", &remotes), "feature/x");
        assert_eq!(local_name("up/main", &remotes), "main");
        assert_eq!(local_name("upstream/main", &remotes), "upstream/main");
        assert_eq!(local_name("main", &remotes), "main");
    }

    #[test]
    fn test_exit_status_display() {
        assert_eq!(ExitStatus(Some(2)).to_string(), "exit code 2");
        assert!(!ExitStatus(None).success());
    }

    #[test]
    fn test_discover_work_dir_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let work_dir = discover_work_dir(&nested).unwrap();
        assert_eq!(
            std::fs::canonicalize(work_dir).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn test_discover_work_dir_rejects_bare_repo() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init_bare(dir.path()).unwrap();
        let err = discover_work_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CommandError::BareRepo(_)), "got: {err:?}");
    }

    fn git_available() -> bool {
        ProcessCommand::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[test]
    fn test_process_runner_relays_stdout() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut runner = ProcessRunner::new(dir.path());
        let mut out = Vec::new();
        let output = runner.run_relayed(&["--version"], &mut out).unwrap();
        assert!(output.success());
        assert!(output.stdout.starts_with("git version"));
        assert_eq!(String::from_utf8(out).unwrap(), output.stdout);
    }

    #[test]
    fn test_process_runner_relays_stderr_after_stdout() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let mut runner = ProcessRunner::new(dir.path());
        let mut out = Vec::new();
        let output = runner
            .run_relayed(&["checkout", "no-such-branch"], &mut out)
            .unwrap();
        assert!(!output.success());
        assert!(output.stderr.contains("no-such-branch"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}{}", output.stdout, output.stderr)
        );
    }

    #[test]
    fn test_default_relay_writes_captured_output() {
        let mut runner = Scripted::default().respond(0, "out\n", "err\n");
        let mut out = Vec::new();
        let output = runner.run_relayed(&["pull"], &mut out).unwrap();
        assert!(output.success());
        assert_eq!(String::from_utf8(out).unwrap(), "out\nerr\n");
        assert_eq!(runner.calls, vec!["pull"]);
    }
}

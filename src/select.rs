//! Interactive branch selection over a line-oriented console
//!
//! Every prompt renders a fresh [`BranchTree`] and then loops: read a line,
//! resolve it against the menu, and either return or report why the input was
//! rejected. Resolving a line depends only on the line, the menu and the
//! remembered default.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use thiserror::Error;

use crate::range::{RangeError, parse_ranges};
use crate::style::Style;
use crate::tree::{BranchMenu, BranchTree};

/// Rejected input; the prompt is shown again
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectError {
    #[error("Invalid input. Please enter a single number.")]
    NotANumber(String),
    #[error("Invalid number. Please enter a number between 1 and {max}.")]
    OutOfRange { index: i64, max: usize },
    #[error("Invalid input: {0}. Please use numbers, commas, and hyphens (e.g., 1,3-5).")]
    Range(#[from] RangeError),
    #[error(
        "Invalid input: index {index} is out of range (1-{max}). \
         Please use numbers, commas, and hyphens (e.g., 1,3-5)."
    )]
    IndexOutOfRange { index: usize, max: usize },
}

/// Errors that end a prompt without a selection
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("input closed before a selection was made")]
    InputClosed,
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of resolving one line of input against a menu
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    Chosen(T),
    Default(T),
    NoSelection,
    Invalid(SelectError),
}

/// Line-oriented console: blocking line reads in, prompts and relayed output out
#[derive(Debug)]
pub struct Console<I, O> {
    input: I,
    output: O,
    style: Style,
}

impl Console<StdinLock<'static>, Stdout> {
    /// Console bound to the process's stdin and stdout
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
            style: Style::for_stdout(),
        }
    }
}

impl<I: BufRead, O: Write> Console<I, O> {
    /// Console without styling, used for scripted input
    pub fn new(input: I, output: O) -> Self {
        Self {
            input,
            output,
            style: Style::plain(),
        }
    }

    #[must_use]
    pub fn style(&self) -> Style {
        self.style
    }

    /// Read one line without its line terminator, `None` once input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if flushing the pending prompt or reading fails.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }

    pub fn into_output(self) -> O {
        self.output
    }
}

impl<I, O: Write> Write for Console<I, O> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

/// The remembered branch, as long as it can still be picked from this menu
fn usable_default<'a>(menu: &BranchMenu, remembered: Option<&'a str>) -> Option<&'a str> {
    remembered.filter(|branch| menu.contains(branch))
}

/// Resolve input for a prompt accepting exactly one number
#[must_use]
pub fn resolve_single(input: &str, menu: &BranchMenu, default: Option<&str>) -> Resolution<String> {
    let input = input.trim();
    if input.is_empty() {
        return match default {
            Some(branch) => Resolution::Default(branch.to_string()),
            None => Resolution::NoSelection,
        };
    }

    let Ok(index) = input.parse::<i64>() else {
        return Resolution::Invalid(SelectError::NotANumber(input.to_string()));
    };
    match usize::try_from(index).ok().and_then(|i| menu.get(i)) {
        Some(branch) => Resolution::Chosen(branch.to_string()),
        None => Resolution::Invalid(SelectError::OutOfRange {
            index,
            max: menu.len(),
        }),
    }
}

/// Resolve input for a prompt accepting numbers and ranges such as `1,3-5,8`.
///
/// A single index outside the menu rejects the whole line.
#[must_use]
pub fn resolve_multi(
    input: &str,
    menu: &BranchMenu,
    default: Option<&str>,
) -> Resolution<Vec<String>> {
    let input = input.trim();
    if input.is_empty() {
        return match default {
            Some(branch) => Resolution::Default(vec![branch.to_string()]),
            None => Resolution::NoSelection,
        };
    }

    let indices = match parse_ranges(input, menu.len()) {
        Ok(indices) => indices,
        Err(RangeError::OutOfBounds { index, max }) => {
            return Resolution::Invalid(SelectError::IndexOutOfRange { index, max });
        }
        Err(e) => return Resolution::Invalid(e.into()),
    };
    let mut branches = Vec::with_capacity(indices.len());
    for index in indices {
        let Some(branch) = menu.get(index) else {
            return Resolution::Invalid(SelectError::IndexOutOfRange {
                index,
                max: menu.len(),
            });
        };
        branches.push(branch.to_string());
    }
    Resolution::Chosen(branches)
}

fn prompt_loop<I, O, T>(
    console: &mut Console<I, O>,
    kind: &str,
    branches: &[String],
    remembered: Option<&str>,
    hint: Option<&str>,
    resolve: fn(&str, &BranchMenu, Option<&str>) -> Resolution<T>,
) -> Result<Option<T>, PromptError>
where
    I: BufRead,
    O: Write,
{
    let menu = BranchTree::build(branches).menu();
    let default = usable_default(&menu, remembered);
    let sty = console.style();

    writeln!(console)?;
    writeln!(console, "{}", sty.heading(&format!("Please select a {kind} branch:")))?;
    write!(console, "{menu}")?;

    loop {
        write!(console, "Enter number (1-{})", menu.len())?;
        if let Some(hint) = hint {
            write!(console, " {hint}")?;
        }
        match default {
            Some(branch) => write!(console, " [default: {branch}]: ")?,
            None => write!(console, ": ")?,
        }

        let line = console.read_line()?.ok_or(PromptError::InputClosed)?;
        match resolve(&line, &menu, default) {
            Resolution::Chosen(choice) => return Ok(Some(choice)),
            Resolution::Default(choice) => {
                writeln!(console, "Using default: {}", default.unwrap_or_default())?;
                return Ok(Some(choice));
            }
            Resolution::NoSelection => {
                writeln!(console, "No selection made.")?;
                return Ok(None);
            }
            Resolution::Invalid(e) => {
                log::debug!("Rejected selection {line:?}: {e}");
                writeln!(console, "{}", sty.failure(&e.to_string()))?;
            }
        }
    }
}

/// Prompt for a single branch, offering `remembered` as the default when present.
///
/// Returns `None` when the user submits an empty line and no default applies.
///
/// # Errors
///
/// Returns `PromptError::InputClosed` if input ends before a selection is
/// made, or `PromptError::Io` if the console fails.
pub fn select_branch<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    kind: &str,
    branches: &[String],
    remembered: Option<&str>,
) -> Result<Option<String>, PromptError> {
    prompt_loop(console, kind, branches, remembered, None, resolve_single)
}

/// Prompt for one or more branches using numbers and ranges.
///
/// Returns an empty list when the user submits an empty line and no default
/// applies; the default alone yields a one-element list.
///
/// # Errors
///
/// Returns `PromptError::InputClosed` if input ends before a selection is
/// made, or `PromptError::Io` if the console fails.
pub fn select_branches<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    kind: &str,
    branches: &[String],
    remembered: Option<&str>,
) -> Result<Vec<String>, PromptError> {
    let selected = prompt_loop(
        console,
        kind,
        branches,
        remembered,
        Some("(e.g., 1,3-5,8)"),
        resolve_multi,
    )?;
    Ok(selected.unwrap_or_default())
}

use std::io::IsTerminal;

use anstyle::{AnsiColor, Color, Effects, Reset};

const HEADING: anstyle::Style = anstyle::Style::new().effects(Effects::BOLD);
const SUCCESS: anstyle::Style = anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
const FAILURE: anstyle::Style = anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
const WARNING: anstyle::Style = anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

/// Console styling, only emitting escape codes when writing to a terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    /// Never emit escape codes
    #[must_use]
    pub fn plain() -> Self {
        Self { color: false }
    }

    #[must_use]
    pub fn for_stdout() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }

    #[must_use]
    pub fn for_stderr() -> Self {
        Self {
            color: std::io::stderr().is_terminal(),
        }
    }

    fn paint(self, style: anstyle::Style, s: &str) -> String {
        if self.color {
            format!("{style}{s}{Reset}")
        } else {
            s.to_string()
        }
    }

    #[must_use]
    pub fn heading(self, s: &str) -> String {
        self.paint(HEADING, s)
    }

    #[must_use]
    pub fn success(self, s: &str) -> String {
        self.paint(SUCCESS, s)
    }

    #[must_use]
    pub fn failure(self, s: &str) -> String {
        self.paint(FAILURE, s)
    }

    #[must_use]
    pub fn warning(self, s: &str) -> String {
        self.paint(WARNING, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_style_is_passthrough() {
        let sty = Style::plain();
        assert_eq!(sty.heading("x"), "x");
        assert_eq!(sty.failure("boom"), "boom");
    }

    #[test]
    fn test_color_wraps_with_reset() {
        let sty = Style { color: true };
        let painted = sty.failure("boom");
        assert!(painted.starts_with("\x1b["));
        assert!(painted.contains("boom"));
        assert!(painted.ends_with("\x1b[0m"));
    }
}

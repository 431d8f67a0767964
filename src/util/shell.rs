//! Shell output for the CLI.
//!
//! Status lines go to stderr as `{status:>12} {message}`. In JSON mode the
//! status lines are suppressed and results are printed to stdout as JSON,
//! so the two never mix.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use serde::Serialize;

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Always,
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Loaded,
    Finished,

    // In-progress statuses (cyan)
    Resolving,
    Running,

    Info,
    Warning,
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Loaded => "Loaded",
            Status::Finished => "Finished",
            Status::Resolving => "Resolving",
            Status::Running => "Running",
            Status::Info => "Info",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Loaded | Status::Finished => "\x1b[1;32m",
            Status::Resolving | Status::Running => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Central shell for CLI output.
#[derive(Debug)]
pub struct Shell {
    json: bool,
    use_color: bool,
}

impl Shell {
    pub fn new(json: bool, color: ColorChoice) -> Self {
        let use_color = !json
            && match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            };
        Shell { json, use_color }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message. Ignored in JSON mode.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.json {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print a result value to stdout as pretty JSON.
    pub fn json_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", rendered)?;
        stdout.flush()?;
        Ok(())
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_alignment() {
        let shell = Shell::new(false, ColorChoice::Never);
        assert_eq!(shell.format_status(Status::Loaded), "      Loaded");
        assert_eq!(shell.format_status(Status::Resolving), "   Resolving");
    }

    #[test]
    fn test_json_mode_disables_color() {
        let shell = Shell::new(true, ColorChoice::Always);
        assert!(shell.is_json());
        assert!(!shell.use_color());
    }

    #[test]
    fn test_colored_status() {
        let shell = Shell::new(false, ColorChoice::Always);
        let prefix = shell.format_status(Status::Error);
        assert!(prefix.starts_with("\x1b[1;31m"));
        assert!(prefix.ends_with("\x1b[0m"));
    }
}

//! Output routing that respects json/quiet/color modes.
//!
//! Payloads go to stdout. Guidance and warnings go to stderr so `--json`
//! output stays parseable.

use crate::error::Result;
use crate::format::{TextFormatOptions, terminal_width};
use colored::Colorize;
use serde::Serialize;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Colored text for a terminal
    Color,
    /// Plain text, no ANSI codes (for piping)
    Plain,
    /// JSON output only
    Json,
    /// Minimal output (quiet mode)
    Quiet,
}

/// Central output coordinator.
#[derive(Debug, Clone, Copy)]
pub struct OutputContext {
    mode: OutputMode,
    width: usize,
}

impl OutputContext {
    /// Create from CLI-style flags.
    #[must_use]
    pub fn from_flags(json: bool, quiet: bool, no_color: bool) -> Self {
        let mode = if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else if no_color || std::env::var("NO_COLOR").is_ok() || !std::io::stdout().is_terminal()
        {
            OutputMode::Plain
        } else {
            OutputMode::Color
        };
        colored::control::set_override(mode == OutputMode::Color);

        Self {
            mode,
            width: terminal_width(),
        }
    }

    #[must_use]
    pub const fn with_mode(mode: OutputMode) -> Self {
        Self { mode, width: 80 }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Text options for the `format` renderers.
    #[must_use]
    pub fn text_options(&self) -> TextFormatOptions {
        TextFormatOptions {
            use_color: self.mode == OutputMode::Color,
            max_width: (self.mode == OutputMode::Color).then_some(self.width),
        }
    }

    /// Print rendered lines in text modes.
    pub fn lines(&self, lines: &[String]) {
        if matches!(self.mode, OutputMode::Color | OutputMode::Plain) {
            for line in lines {
                println!("{line}");
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json_pretty<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.is_json() {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }

    /// Non-fatal notice on stderr; shown in every mode but quiet.
    pub fn notice(&self, message: &str) {
        match self.mode {
            OutputMode::Color => eprintln!("{} {message}", "ℹ".blue()),
            OutputMode::Plain | OutputMode::Json => eprintln!("{message}"),
            OutputMode::Quiet => {}
        }
    }

    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Color => eprintln!("{} {}", "⚠".yellow().bold(), message.yellow()),
            OutputMode::Plain | OutputMode::Json => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
        }
    }
}

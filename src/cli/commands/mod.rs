//! Subcommand implementations.

pub mod completions;
pub mod find;
pub mod show;
pub mod version;

use crate::cli::Cli;
use crate::config::{self, CliOverrides, TriageConfig};
use crate::error::Result;
use crate::output::OutputContext;
use std::env;
use tracing::debug;

/// Resolved configuration and output routing shared by commands.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: TriageConfig,
    pub output: OutputContext,
}

impl CommandContext {
    /// Load layered config from the current directory and build output routing.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is unreadable or holds invalid values.
    pub fn load(cli: &Cli) -> Result<Self> {
        let layer = config::load_config(&env::current_dir()?, &build_cli_overrides(cli))?;
        let config = TriageConfig::from_layer(&layer)?;
        debug!(?config, "Resolved configuration");
        let output = OutputContext::from_flags(cli.json, cli.quiet, config.no_color);
        Ok(Self { config, output })
    }
}

#[must_use]
pub fn build_cli_overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        xcrun: cli.xcrun.clone(),
        timeout: cli.timeout,
        no_color: cli.no_color.then_some(true),
    }
}

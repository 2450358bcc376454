use clap::Parser;
use std::io::{self, IsTerminal};
use xcresult_triage::cli::commands::{self, CommandContext};
use xcresult_triage::cli::{Cli, Commands};
use xcresult_triage::logging::init_logging;
use xcresult_triage::output::OutputContext;
use xcresult_triage::{StructuredError, TriageError};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = match &cli.command {
        Commands::Version => {
            commands::version::execute(&OutputContext::from_flags(cli.json, cli.quiet, cli.no_color))
        }
        Commands::Completions(args) => commands::completions::execute(
            args,
            &OutputContext::from_flags(cli.json, cli.quiet, cli.no_color),
        ),
        Commands::Show(args) => {
            CommandContext::load(&cli).and_then(|ctx| commands::show::execute(args, &ctx))
        }
        Commands::Find(args) => CommandContext::load(&cli)
            .and_then(|ctx| commands::find::execute(args, &ctx.output)),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &TriageError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

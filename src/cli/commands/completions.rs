//! Shell completion scripts for `xctriage`.
//!
//! The scripts complete the subcommands (`show`, `find`, `version`,
//! `completions`) and the global flags. Path arguments carry value hints, so
//! `show <PATH>` offers files and directories (result bundles are
//! directories), `find [DIR]` offers directories only, and `--xcrun` offers
//! commands on `PATH`. Test selectors are not completed; they depend on the
//! bundle being inspected.
//!
//! ```bash
//! xctriage completions bash > /usr/local/etc/bash_completion.d/xctriage
//! xctriage completions zsh -o ~/.zsh/completions/_xctriage
//! ```

use crate::cli::{Cli, CompletionsArgs, ShellType};
use crate::error::Result;
use crate::output::OutputContext;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;
use tracing::info;

const BIN_NAME: &str = "xctriage";

/// Write the completion script to `--output` or stdout.
///
/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn execute(args: &CompletionsArgs, output: &OutputContext) -> Result<()> {
    info!(shell = ?args.shell, output = ?args.output, "Generating shell completions");

    let shell = convert_shell_type(args.shell);
    if let Some(path) = &args.output {
        let mut file = std::fs::File::create(path)?;
        write_script(shell, &mut file);
        info!(path = %path.display(), "Wrote completion script");
        output.notice(&format!("Wrote {shell} completions to {}", path.display()));
    } else {
        write_script(shell, &mut io::stdout());
    }

    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn io::Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
}

const fn convert_shell_type(shell: ShellType) -> Shell {
    match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
        ShellType::PowerShell => Shell::PowerShell,
        ShellType::Elvish => Shell::Elvish,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::output::OutputMode;
    use tempfile::TempDir;
    use tracing::info;

    fn script(shell: Shell) -> String {
        let mut out = Vec::new();
        write_script(shell, &mut out);
        String::from_utf8(out).expect("utf8 script")
    }

    #[test]
    fn test_convert_shell_type() {
        assert_eq!(convert_shell_type(ShellType::Bash), Shell::Bash);
        assert_eq!(convert_shell_type(ShellType::Zsh), Shell::Zsh);
        assert_eq!(convert_shell_type(ShellType::Fish), Shell::Fish);
        assert_eq!(convert_shell_type(ShellType::PowerShell), Shell::PowerShell);
        assert_eq!(convert_shell_type(ShellType::Elvish), Shell::Elvish);
    }

    #[test]
    fn bash_script_lists_subcommands() {
        let script = script(Shell::Bash);
        assert!(script.contains("_xctriage"), "should define _xctriage function");
        assert!(script.contains("show"));
        assert!(script.contains("find"));
        assert!(script.contains("--xcrun"));
    }

    #[test]
    fn zsh_script_completes_bundle_paths() {
        let script = script(Shell::Zsh);
        assert!(script.contains("#compdef xctriage"));
        assert!(script.contains("_files -/"), "find should complete directories");
        assert!(script.contains("_command_names"), "--xcrun should complete commands");
    }

    #[test]
    fn output_flag_writes_file() {
        init_test_logging();
        info!("output_flag_writes_file: starting");
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("xctriage.fish");
        let args = CompletionsArgs {
            shell: ShellType::Fish,
            output: Some(path.clone()),
        };

        execute(&args, &OutputContext::with_mode(OutputMode::Quiet)).expect("write completions");

        let written = std::fs::read_to_string(&path).expect("read script");
        assert!(written.contains("complete -c xctriage"));
        info!("output_flag_writes_file: assertions passed");
    }
}

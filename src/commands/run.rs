//! Command dispatch logic for metric-engine

use super::common::{LogLevel, init_logging};
use super::{ExecuteArgs, InitArgs, ValidateArgs, execute_metric, init_schema, validate_metric};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "metric-engine", author, version, long_about = None)]
#[command(about = "Execute and govern business metric definitions")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a metric definition against governance rules and run its test cases
    Validate(ValidateArgs),
    /// Execute one metric request against a set of definitions
    Execute(ExecuteArgs),
    /// Generate a default governance schema file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.log_level);

    match &cli.command {
        Command::Validate(validate_args) => validate_metric(host, validate_args),
        Command::Execute(execute_args) => execute_metric(host, execute_args),
        Command::Init(init_args) => init_schema(host, init_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_dispatches_init() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("schema.json");
        let mut host = TestHost::new();

        run(&mut host, ["metric-engine", "init", output.to_str().unwrap()]).unwrap();

        assert!(output.exists());
        assert!(host.output_str().starts_with("Generated default governance schema"));
    }

    #[test]
    fn test_log_level_is_global() {
        let cli = Cli::try_parse_from(["metric-engine", "init", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(matches!(cli.command, Command::Init(_)));
    }
}

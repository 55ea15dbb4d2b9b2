use super::Host;
use crate::Result;
use crate::config::GovernanceSchema;
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output schema file path; the extension picks YAML, TOML, or JSON
    #[arg(value_name = "PATH", default_value = "metric_schema.yml")]
    pub output: Utf8PathBuf,
}

pub fn init_schema<H: Host>(host: &mut H, args: &InitArgs) -> Result<()> {
    GovernanceSchema::save_default(&args.output)?;
    let _ = writeln!(host.output(), "Generated default governance schema: {}", args.output);
    Ok(())
}

use super::Host;
use crate::Result;
use crate::config::{GovernanceSchema, load_document};
use crate::governance::{ValidationReport, validate};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ohno::app_err;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the metric definition document
    #[arg(value_name = "METRIC")]
    pub metric: Utf8PathBuf,

    /// Path to a governance schema (default is the built-in schema)
    #[arg(long, short = 's', value_name = "PATH")]
    pub schema: Option<Utf8PathBuf>,
}

fn validate_metric_inner(metric: &Utf8Path, schema: Option<&Utf8Path>) -> Result<ValidationReport> {
    let schema = GovernanceSchema::load(schema)?;
    let doc = load_document(metric)?;
    Ok(validate(&doc, &schema))
}

fn pass_fail(passed: bool) -> &'static str {
    if passed { "PASS" } else { "FAIL" }
}

fn write_report(out: &mut impl Write, args: &ValidateArgs, report: &ValidationReport) {
    let schema = args.schema.as_ref().map_or("built-in", |s| s.as_str());

    let _ = writeln!(out, "=== Metric Governance Validation ===");
    let _ = writeln!(out, "Schema: {schema}");
    let _ = writeln!(out, "Metric: {}", args.metric);
    let _ = writeln!(out);

    let _ = writeln!(out, "VALIDATION: {}", pass_fail(report.errors.is_empty()));
    for error in &report.errors {
        let _ = writeln!(out, " - {error}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "MATH TESTS: {}", pass_fail(report.math_failures.is_empty()));
    for failure in &report.math_failures {
        let _ = writeln!(out, " - {failure}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "IMPLEMENTATION ASSUMPTIONS TO CONFIRM:");
    for assumption in &report.assumptions {
        let _ = writeln!(out, " - {assumption}");
    }
}

pub fn validate_metric<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    match validate_metric_inner(&args.metric, args.schema.as_deref()) {
        Ok(report) => {
            write_report(&mut host.output(), args, &report);

            if report.passed() {
                return Ok(());
            }

            let _ = writeln!(host.error(), "❌ Metric definition {} failed governance validation", args.metric);
            host.exit(1);
            Err(app_err!("metric definition {} failed governance validation", args.metric))
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Metric validation could not run: {e}");
            host.exit(1);
            Err(e)
        }
    }
}

use super::Host;
use crate::Result;
use crate::config::load_definitions;
use crate::engine::{MetricExecutionRequest, MetricExecutionService};
use crate::metrics::MetricRegistry;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ohno::{IntoAppError, app_err};
use std::fs;
use std::io::Write;
use std::sync::Arc;

const LOG_TARGET: &str = "   execute";

#[derive(Parser, Debug)]
pub struct ExecuteArgs {
    /// Metric definition file, or a directory of definition files
    #[arg(long, short = 'd', value_name = "PATH")]
    pub definitions: Utf8PathBuf,

    /// Execution request as a JSON or YAML file
    #[arg(long, short = 'r', value_name = "PATH")]
    pub request: Utf8PathBuf,
}

fn load_request(path: &Utf8Path) -> Result<MetricExecutionRequest> {
    let text = fs::read_to_string(path).into_app_err_with(|| format!("reading execution request from {path}"))?;

    let request = match path.extension().unwrap_or_default() {
        "yml" | "yaml" => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing YAML execution request from {path}"))?,
        _ => serde_json::from_str(&text).into_app_err_with(|| format!("parsing JSON execution request from {path}"))?,
    };

    Ok(request)
}

fn build_service(definitions: &Utf8Path) -> Result<MetricExecutionService> {
    let registry = MetricRegistry::new(load_definitions(definitions)?)?;
    Ok(MetricExecutionService::new(Arc::new(registry)))
}

pub fn execute_metric<H: Host>(host: &mut H, args: &ExecuteArgs) -> Result<()> {
    let prepared = build_service(&args.definitions).and_then(|service| load_request(&args.request).map(|request| (service, request)));

    let (service, request) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Metric execution could not start: {e}");
            host.exit(1);
            return Err(e);
        }
    };

    log::info!(target: LOG_TARGET, "Executing '{}' at tier '{}'", request.metric_id, request.requesting_user_tier);

    match service.execute(&request) {
        Ok(result) => {
            let json = serde_json::to_string_pretty(&result).into_app_err("serializing execution result")?;
            let _ = writeln!(host.output(), "{json}");
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ error[{}]: {e}", e.kind());
            host.exit(1);
            Err(app_err!("metric execution failed: {e}"))
        }
    }
}

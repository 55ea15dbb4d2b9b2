use crate::Result;
use crate::metrics::MetricDefinition;
use camino::Utf8Path;
use ohno::{IntoAppError, app_err};
use std::fs;

const LOG_TARGET: &str = "    config";

const EXTENSIONS: [&str; 4] = ["toml", "yml", "yaml", "json"];

/// Load metric definitions from a file, or from every definition file in a directory.
///
/// Directory entries are read in file name order so registration is deterministic. A YAML or
/// JSON file may hold one definition or a list of them; a TOML file holds one.
pub fn load_definitions(path: &Utf8Path) -> Result<Vec<MetricDefinition>> {
    if !path.is_dir() {
        return load_file(path);
    }

    let mut files = Vec::new();
    for entry in path.read_dir_utf8().into_app_err_with(|| format!("reading directory {path}"))? {
        let entry = entry.into_app_err_with(|| format!("reading directory {path}"))?;
        let file = entry.path();
        if file.is_file() && EXTENSIONS.contains(&file.extension().unwrap_or_default()) {
            files.push(file.to_path_buf());
        }
    }

    files.sort();

    let mut definitions = Vec::new();
    for file in &files {
        definitions.extend(load_file(file)?);
    }

    log::info!(target: LOG_TARGET, "Loaded {} definition(s) from {} file(s) in {path}", definitions.len(), files.len());
    Ok(definitions)
}

/// Load a definition document without interpreting it, for governance checks.
pub fn load_document(path: &Utf8Path) -> Result<serde_yaml::Value> {
    let text = fs::read_to_string(path).into_app_err_with(|| format!("reading metric definition from {path}"))?;

    let extension = path.extension().unwrap_or_default();
    let doc = match extension {
        "toml" => toml::from_str(&text).into_app_err_with(|| format!("parsing TOML metric definition from {path}"))?,
        "yml" | "yaml" => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing YAML metric definition from {path}"))?,
        "json" => serde_json::from_str(&text).into_app_err_with(|| format!("parsing JSON metric definition from {path}"))?,
        _ => return Err(app_err!("unsupported metric definition file extension: {extension}")),
    };

    Ok(doc)
}

fn load_file(path: &Utf8Path) -> Result<Vec<MetricDefinition>> {
    let doc = load_document(path)?;

    let definitions = if doc.is_sequence() {
        serde_yaml::from_value(doc).into_app_err_with(|| format!("interpreting metric definitions in {path}"))?
    } else {
        vec![serde_yaml::from_value(doc).into_app_err_with(|| format!("interpreting metric definition in {path}"))?]
    };

    log::debug!(target: LOG_TARGET, "Read {} definition(s) from {path}", definitions.len());
    Ok(definitions)
}

use std::path::Path;

use tracing::{debug, warn};

use crate::config::types::{LaunchConfiguration, DEFAULT_PORT};
use crate::error::{Result, RunletError};

/// Name of the configuration file at the scratch root, written there by the
/// packaging step.
pub const CONFIG_FILE_NAME: &str = "runlet.conf";

/// Read and parse the launch configuration from the extracted bundle.
///
/// Read once; there is no live reload.
pub fn load_launch_config(scratch: &Path) -> Result<LaunchConfiguration> {
    let path = scratch.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        return Err(RunletError::ConfigNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(&path)?;
    parse(&content, &path.display().to_string())
}

/// Parse flat `key=value` lines. Blank lines and `#` comments are skipped,
/// malformed lines are skipped with a log, unknown keys are ignored for
/// forward compatibility.
fn parse(content: &str, file: &str) -> Result<LaunchConfiguration> {
    let mut target: Option<String> = None;
    let mut params: Vec<String> = Vec::new();
    let mut port = DEFAULT_PORT;
    let mut deps_suffix: Option<String> = None;
    let mut precompile = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            debug!(line, "Skipping malformed configuration line");
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "target" => target = Some(value.to_string()),
            "params" => params = value.split_whitespace().map(String::from).collect(),
            "port" => match value.parse() {
                Ok(p) => port = p,
                Err(_) => warn!(value, "Invalid port in configuration, keeping default"),
            },
            "deps_suffix" => deps_suffix = Some(value.to_string()),
            "precompile" => precompile = value.eq_ignore_ascii_case("true"),
            _ => debug!(key, "Ignoring unknown configuration key"),
        }
    }

    let target = target.ok_or_else(|| RunletError::MissingRequiredConfig {
        key: "target".to_string(),
        file: file.to_string(),
    })?;

    Ok(LaunchConfiguration {
        target,
        params,
        port,
        deps_suffix,
        precompile,
    })
}

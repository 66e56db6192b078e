//! Logging
//!
//! `tracing` subscriber setup for the library and the `metacat` binary. Level,
//! format and destination come from [`LoggingConfig`]; `METACAT_LOG*` environment
//! variables override it.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const ENV_FILTER: &str = "METACAT_LOG";
pub const ENV_FORMAT: &str = "METACAT_LOG_FORMAT";
pub const ENV_OUTPUT: &str = "METACAT_LOG_OUTPUT";
pub const ENV_FILE: &str = "METACAT_LOG_FILE";
pub const ENV_MODULES: &str = "METACAT_LOG_MODULES";

/// Resolve the log file path: explicit path, then `METACAT_LOG_FILE`, then the
/// configured file, then `metacat.log` in the platform state directory (scoped to
/// the catalog when one is given).
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    catalog: Option<&Path>,
) -> Result<PathBuf, ApiError> {
    if let Some(p) = cli_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    if let Ok(env_path) = std::env::var(ENV_FILE) {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(p);
    }
    default_log_file_path(catalog)
}

fn default_log_file_path(catalog: Option<&Path>) -> Result<PathBuf, ApiError> {
    let project_dirs = directories::ProjectDirs::from("", "metacat", "metacat").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform state directory for log file".to_string())
    })?;
    let mut dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir())
        .to_path_buf();
    if let Some(catalog) = catalog {
        let canonical = dunce::canonicalize(catalog).map_err(|e| {
            ApiError::ConfigError(format!("Failed to canonicalize catalog path: {}", e))
        })?;
        for component in canonical.components() {
            if let std::path::Component::Normal(name) = component {
                dir = dir.join(name);
            }
        }
    }
    Ok(dir.join("metacat.log"))
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file when output includes a file; `None` uses the state directory default.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored text output on terminals.
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module level overrides, e.g. `metacat::tree = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

// Status records go to stdout, so diagnostics stay on stderr.
fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Install the global subscriber.
///
/// Fails with [`ApiError::ConfigError`] on invalid settings or when a global
/// subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    init_catalog_logging(config, None)
}

/// Like [`init_logging`], with the default log file placed under `catalog`'s
/// scope in the state directory.
pub fn init_catalog_logging(config: Option<&LoggingConfig>, catalog: Option<&Path>) -> Result<(), ApiError> {
    if config.is_some_and(|c| !c.enabled) {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)));
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true) && !output.file;
    let writer = build_writer(&output, config, catalog)?;

    let subscriber = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn build_writer(
    output: &OutputDestinations,
    config: Option<&LoggingConfig>,
    catalog: Option<&Path>,
) -> Result<BoxMakeWriter, ApiError> {
    let writer = match (output.file, output.stdout, output.stderr) {
        (true, _, true) => BoxMakeWriter::new(open_log_file(config, catalog)?.and(std::io::stderr)),
        (true, _, false) => BoxMakeWriter::new(open_log_file(config, catalog)?),
        (false, true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        (false, false, true) => BoxMakeWriter::new(std::io::stderr),
        (false, _, false) => BoxMakeWriter::new(std::io::stdout),
    };
    Ok(writer)
}

/// Log file for `config`: its explicit file, or the default scoped to an existing catalog.
fn config_log_file(config: Option<&LoggingConfig>, catalog: Option<&Path>) -> Result<PathBuf, ApiError> {
    let catalog = catalog.filter(|path| path.exists());
    resolve_log_file_path(None, config.and_then(|c| c.file.clone()), catalog)
}

fn open_log_file(
    config: Option<&LoggingConfig>,
    catalog: Option<&Path>,
) -> Result<std::sync::Arc<std::fs::File>, ApiError> {
    let log_file = config_log_file(config, catalog)?;
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ApiError::ConfigError(format!("Failed to create log directory: {}", e)))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| {
            ApiError::ConfigError(format!("Failed to open log file {}: {}", log_file.display(), e))
        })?;
    Ok(std::sync::Arc::new(file))
}

/// `METACAT_LOG` wins outright; otherwise the configured level plus module directives.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut directives: Vec<String> = config
        .map(|c| {
            c.modules
                .iter()
                .map(|(module, level)| format!("{}={}", module, level))
                .collect()
        })
        .unwrap_or_default();
    if let Ok(modules) = std::env::var(ENV_MODULES) {
        directives.extend(
            modules
                .split(',')
                .filter_map(|spec| spec.split_once('='))
                .map(|(module, level)| format!("{}={}", module.trim(), level.trim())),
        );
    }

    let mut filter = EnvFilter::new(level);
    for directive in directives {
        filter = filter.add_directive(directive.parse().map_err(|e| {
            ApiError::ConfigError(format!("Invalid log directive '{}': {}", directive, e))
        })?);
    }
    Ok(filter)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Text,
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<LogFormat, ApiError> {
    let env = std::env::var(ENV_FORMAT).ok();
    let format = env
        .as_deref()
        .filter(|f| *f == "json" || *f == "text")
        .or_else(|| config.map(|c| c.format.as_str()))
        .unwrap_or("text");
    match format {
        "json" => Ok(LogFormat::Json),
        "text" => Ok(LogFormat::Text),
        other => Err(ApiError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<OutputDestinations, ApiError> {
    if let Ok(output) = std::env::var(ENV_OUTPUT) {
        return parse_output_destinations(&output);
    }
    parse_output_destinations(config.map(|c| c.output.as_str()).unwrap_or("stderr"))
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, ApiError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        _ => {
            return Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                output
            )))
        }
    };
    Ok(OutputDestinations { stdout, stderr, file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_log_to_stderr() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert_eq!(config.output, "stderr");
        assert_eq!(config.file, None);
    }

    #[test]
    fn output_destinations_parse() {
        assert_eq!(
            parse_output_destinations("file+stderr").unwrap(),
            OutputDestinations {
                stdout: false,
                stderr: true,
                file: true
            }
        );
        assert_eq!(
            parse_output_destinations("both").unwrap(),
            OutputDestinations {
                stdout: true,
                stderr: true,
                file: false
            }
        );
        assert!(parse_output_destinations("syslog").is_err());
    }

    #[test]
    fn invalid_format_is_rejected() {
        let config = LoggingConfig {
            format: "xml".to_string(),
            ..LoggingConfig::default()
        };
        assert!(determine_format(Some(&config)).is_err());
        assert_eq!(determine_format(None).unwrap(), LogFormat::Text);
    }

    #[test]
    fn explicit_log_file_wins() {
        let path = resolve_log_file_path(
            Some(PathBuf::from("/tmp/cli.log")),
            Some(PathBuf::from("/tmp/config.log")),
            None,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/cli.log"));
    }

    #[test]
    fn default_log_file_is_scoped_to_catalog() {
        let temp = tempfile::tempdir().unwrap();
        let path = resolve_log_file_path(None, None, Some(temp.path())).unwrap();
        assert!(path.ends_with("metacat.log"));
        let name = temp.path().file_name().unwrap();
        assert!(path.components().any(|c| c.as_os_str() == name));
    }

    #[test]
    fn file_output_is_scoped_to_the_logged_catalog() {
        if std::env::var_os(ENV_FILE).is_some() {
            return;
        }
        let temp = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            output: "file".to_string(),
            ..LoggingConfig::default()
        };
        let scoped = config_log_file(Some(&config), Some(temp.path())).unwrap();
        let unscoped = config_log_file(Some(&config), None).unwrap();
        assert_ne!(scoped, unscoped);
        let name = temp.path().file_name().unwrap();
        assert!(scoped.components().any(|c| c.as_os_str() == name));

        let missing = temp.path().join("not-created");
        assert_eq!(config_log_file(Some(&config), Some(&missing)).unwrap(), unscoped);
    }

    #[test]
    fn module_directives_must_parse() {
        let mut config = LoggingConfig::default();
        config
            .modules
            .insert("metacat::tree".to_string(), "debug".to_string());
        assert!(build_env_filter(Some(&config)).is_ok());
        config
            .modules
            .insert("metacat::store".to_string(), "loud".to_string());
        assert!(build_env_filter(Some(&config)).is_err());
    }
}

//! Logging System
//!
//! Structured logging on top of `tracing`. Level, format and destination come
//! from [`LoggingConfig`], with `FLATREPO_LOG*` environment variables taking
//! precedence.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Resolve the log file path with precedence: CLI, FLATREPO_LOG_FILE env, config file, default.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    if let Some(p) = cli_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    if let Ok(env_path) = std::env::var("FLATREPO_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    default_log_file_path()
}

fn default_log_file_path() -> Result<PathBuf, ApiError> {
    let project_dirs = directories::ProjectDirs::from("", "flatrepo", "flatrepo").ok_or_else(|| {
        ApiError::ConfigError(
            "Could not determine platform state directory for log file".to_string(),
        )
    })?;
    // macOS and Windows have no state directory
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir())
        .to_path_buf();
    Ok(dir.join("flatrepo.log"))
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file; None means use runtime default
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

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

/// Initialize the global subscriber
///
/// Priority order (highest to lowest):
/// 1. Environment variables (FLATREPO_LOG, FLATREPO_LOG_FORMAT, ...)
/// 2. Configuration (file, then CLI overrides applied by the caller)
/// 3. Defaults
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    if !config.enabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .try_init()
            .map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)));
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let writer = make_writer(&output, config)?;
    // Never emit escape codes into a file
    let ansi = config.color && !output.file;

    let base_subscriber = Registry::default().with(filter);
    let installed = if format == "json" {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init()
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn make_writer(output: &OutputDestinations, config: &LoggingConfig) -> Result<BoxMakeWriter, ApiError> {
    let writer = if output.file {
        let file = open_log_file(config)?;
        if output.stderr {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        }
    } else if output.stdout && output.stderr {
        BoxMakeWriter::new(std::io::stdout.and(std::io::stderr))
    } else if output.stdout {
        BoxMakeWriter::new(std::io::stdout)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };
    Ok(writer)
}

fn open_log_file(config: &LoggingConfig) -> Result<std::sync::Mutex<std::fs::File>, ApiError> {
    let log_file = resolve_log_file_path(None, config.file.clone())?;
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ApiError::ConfigError(format!("Failed to create log directory: {}", e)))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| {
            ApiError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e))
        })?;
    Ok(std::sync::Mutex::new(file))
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env("FLATREPO_LOG") {
        return Ok(filter);
    }

    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, module_level) in &config.modules {
        let directive = format!("{}={}", module, module_level);
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| ApiError::ConfigError(format!("Invalid log directive: {}", e)))?,
        );
    }

    if let Ok(modules_str) = std::env::var("FLATREPO_LOG_MODULES") {
        for module_spec in modules_str.split(',') {
            let parts: Vec<&str> = module_spec.split('=').collect();
            if parts.len() == 2 {
                let directive = format!("{}={}", parts[0].trim(), parts[1].trim());
                filter = filter.add_directive(directive.parse().map_err(|e| {
                    ApiError::ConfigError(format!("Invalid log directive from env: {}", e))
                })?);
            }
        }
    }

    Ok(filter)
}

/// Determine output format from config or environment
fn determine_format(config: &LoggingConfig) -> Result<String, ApiError> {
    if let Ok(format) = std::env::var("FLATREPO_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }

    let format = config.format.as_str();
    if format != "json" && format != "text" {
        return Err(ApiError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }

    Ok(format.to_string())
}

/// Output destinations
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

/// Determine output destinations from config or environment
fn determine_output(config: &LoggingConfig) -> Result<OutputDestinations, ApiError> {
    if let Ok(output) = std::env::var("FLATREPO_LOG_OUTPUT") {
        return parse_output_destinations(&output);
    }
    parse_output_destinations(&config.output)
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
    Ok(OutputDestinations {
        stdout,
        stderr,
        file,
    })
}

//! CLI Tooling
//!
//! Command-line interface over a persisted tree store: import directories as
//! project revisions and query them through the flat repository.

use super::format::{
    format_file_data_text, format_file_list_text, format_import_text, format_json,
    format_not_found, format_written,
};
use crate::config::RepoConfig;
use crate::error::ApiError;
use crate::import::import_directory;
use crate::repository::{FileData, FileItem, FlatRepository, Repository, RepositoryOptions};
use crate::store::persistence::SledTreeSnapshot;
use crate::store::{MemoryTreeStore, TreeStore};
use crate::watch::ChangeListener;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// flatrepo CLI - flat, path-addressed access to a versioned tree store
#[derive(Parser, Debug)]
#[command(name = "flatrepo")]
#[command(about = "Flat repository view over a versioned tree store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory (overrides `store.path` from configuration)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line logging overrides on top of loaded configuration
    pub fn apply_overrides(&self, config: &mut RepoConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
        if let Some(store) = &self.store {
            config.store.path = store.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a directory as a new revision of a project
    Import {
        /// Directory to import
        source: PathBuf,
        /// Project path in the repository, e.g. rules/pricing
        path: String,
        #[arg(long, default_value = "flatrepo")]
        author: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// List the folders under a path
    List {
        #[arg(default_value = "")]
        path: String,
    },
    /// Show the summary of one entry
    Check { path: String },
    /// Write an entry's content (a zip archive for folders) to a file
    Read {
        path: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// List the meaningful revisions of a folder
    History { path: String },
    /// Show the summary of a folder at a revision
    CheckHistory {
        path: String,
        #[arg(long)]
        version: Option<String>,
    },
    /// Write a folder's archive at a revision to a file
    ReadHistory {
        path: String,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Import a directory while observing repository change notifications
    Watch {
        source: PathBuf,
        path: String,
        #[arg(long, default_value = "flatrepo")]
        author: String,
        #[arg(long)]
        comment: Option<String>,
    },
}

/// CLI context owning the opened store
pub struct CliContext {
    snapshot: SledTreeSnapshot,
    store: Arc<MemoryTreeStore>,
    repository: FlatRepository,
    options: RepositoryOptions,
    format: OutputFormat,
}

impl CliContext {
    /// Open the store at `config.store.path` and the repository over it
    pub fn new(config: &RepoConfig, format: OutputFormat) -> Result<Self, ApiError> {
        let snapshot = SledTreeSnapshot::open(&config.store.path)
            .map_err(|e| ApiError::store("Failed to open store", e))?;
        let store = Arc::new(
            snapshot
                .load()
                .map_err(|e| ApiError::store("Failed to load store", e))?,
        );
        let options = RepositoryOptions::from(config);
        let repository = FlatRepository::new(store.clone(), options.clone())?;
        info!(path = %config.store.path.display(), "Opened store");
        Ok(Self {
            snapshot,
            store,
            repository,
            options,
            format,
        })
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Import {
                source,
                path,
                author,
                comment,
            } => {
                let summary =
                    import_directory(&self.store, source, path, author, comment.as_deref())?;
                self.persist()?;
                match self.format {
                    OutputFormat::Json => format_json(&summary),
                    OutputFormat::Text => Ok(format_import_text(&summary)),
                }
            }
            Commands::List { path } => {
                let entries = self.repository.list(path)?;
                self.render_list(&format!("Listing of '{}'", path), &entries)
            }
            Commands::Check { path } => {
                let data = self.repository.check(path)?;
                self.render_data(path, data.as_ref())
            }
            Commands::Read { path, out } => {
                let item = self.repository.read(path)?;
                self.write_item(path, item.as_ref(), out)
            }
            Commands::History { path } => {
                let entries = self.repository.list_history(path)?;
                self.render_list(&format!("History of '{}'", path), &entries)
            }
            Commands::CheckHistory { path, version } => {
                let data = self.repository.check_history(path, version.as_deref())?;
                self.render_data(path, data.as_ref())
            }
            Commands::ReadHistory { path, version, out } => {
                let item = self.repository.read_history(path, version.as_deref())?;
                self.write_item(path, item.as_ref(), out)
            }
            Commands::Watch {
                source,
                path,
                author,
                comment,
            } => self.watch_import(source, path, author, comment.as_deref()),
        }
    }

    fn persist(&self) -> Result<(), ApiError> {
        self.snapshot
            .save(&self.store)
            .map_err(|e| ApiError::store("Failed to save store", e))
    }

    /// Import through a separately opened repository whose observer counts
    /// change notifications; closing it waits for queued notifications.
    fn watch_import(
        &self,
        source: &Path,
        path: &str,
        author: &str,
        comment: Option<&str>,
    ) -> Result<String, ApiError> {
        let store: Arc<dyn TreeStore> = self.store.clone();
        let watched = FlatRepository::new(store, self.options.clone())?;
        let signals = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&signals);
        let listener: Arc<dyn ChangeListener> = Arc::new(move || {
            let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
            info!(signal = seen, "Repository changed");
        });
        watched.set_listener(Some(listener));

        let imported = import_directory(&self.store, source, path, author, comment);
        watched.close();
        let summary = imported?;
        self.persist()?;

        let signals = signals.load(Ordering::SeqCst);
        match self.format {
            OutputFormat::Json => format_json(&json!({
                "import": summary,
                "change_signals": signals,
            })),
            OutputFormat::Text => Ok(format!(
                "{}\nObserved {} change signal(s).",
                format_import_text(&summary),
                signals
            )),
        }
    }

    fn render_list(&self, title: &str, entries: &[FileData]) -> Result<String, ApiError> {
        match self.format {
            OutputFormat::Json => format_json(entries),
            OutputFormat::Text => Ok(format_file_list_text(title, entries)),
        }
    }

    fn render_data(&self, name: &str, data: Option<&FileData>) -> Result<String, ApiError> {
        match (self.format, data) {
            (OutputFormat::Json, data) => format_json(&data),
            (OutputFormat::Text, Some(data)) => Ok(format_file_data_text(data)),
            (OutputFormat::Text, None) => Ok(format_not_found(name)),
        }
    }

    fn write_item(&self, name: &str, item: Option<&FileItem>, out: &Path) -> Result<String, ApiError> {
        let Some(item) = item else {
            return match self.format {
                OutputFormat::Json => format_json(&serde_json::Value::Null),
                OutputFormat::Text => Ok(format_not_found(name)),
            };
        };
        std::fs::write(out, &item.content).map_err(|e| {
            ApiError::ConfigError(format!("Failed to write {}: {}", out.display(), e))
        })?;
        match self.format {
            OutputFormat::Json => format_json(&json!({
                "data": item.data,
                "bytes": item.content.len(),
                "out": out.display().to_string(),
            })),
            OutputFormat::Text => Ok(format_written(item, out)),
        }
    }
}

//! CLI Tooling
//!
//! Command-line surface over one catalog directory: ingest a metadata batch,
//! compute blob keys, show a stored dataset and set the superdataset pointer.

use crate::catalog::{CatalogBuilder, IngestOptions, IngestReport, Status};
use crate::config::{CatalogConfig, ConfigLoader};
use crate::error::{ApiError, IngestError};
use crate::logging::LoggingConfig;
use crate::record::input::{decode_stream, read_input, InputItem};
use crate::tree::{CatalogNode, DatasetNode};
use crate::types::{fields, DatasetRef};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Metacat - incremental metadata catalog builder
#[derive(Parser)]
#[command(name = "metacat")]
#[command(about = "Build and update a content-addressed metadata catalog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Catalog root directory
    #[arg(long, default_value = ".")]
    pub catalog: PathBuf,

    /// Configuration file layered over the catalog's own config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// `base` with any logging flags given on the command line applied.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest one batch of metadata records
    Add {
        /// Metadata file (JSON, JSON array or JSON Lines); "-" reads stdin
        #[arg(long)]
        metadata: String,
        /// Also point super.json at the ingested dataset
        #[arg(long)]
        set_super: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the blob key of a dataset
    Key {
        dataset_id: String,
        dataset_version: String,
        /// Key of the children blob instead of the main blob
        #[arg(long)]
        children: bool,
    },
    /// Show a stored dataset node
    Show {
        dataset_id: String,
        dataset_version: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Point super.json at a dataset
    SetSuper {
        dataset_id: String,
        dataset_version: String,
    },
}

/// Everything a command needs for one catalog.
pub struct CliContext {
    catalog_root: PathBuf,
    config: CatalogConfig,
    builder: CatalogBuilder,
}

impl CliContext {
    pub fn new(catalog_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let catalog_root = if catalog_root.exists() {
            dunce::canonicalize(&catalog_root).map_err(|e| {
                ApiError::InvalidArgument(format!(
                    "Cannot resolve catalog {}: {}",
                    catalog_root.display(),
                    e
                ))
            })?
        } else {
            catalog_root
        };
        let config = match &config_path {
            Some(path) => ConfigLoader::load_with_file(&catalog_root, path)?,
            None => ConfigLoader::load(&catalog_root)?,
        };
        let builder = CatalogBuilder::open(&catalog_root, &config)?;
        Ok(Self {
            catalog_root,
            config,
            builder,
        })
    }

    pub fn catalog_root(&self) -> &Path {
        &self.catalog_root
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn builder(&self) -> &CatalogBuilder {
        &self.builder
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Add {
                metadata,
                set_super,
                format,
            } => {
                let format = OutputFormat::parse(format)?;
                let items = read_metadata(metadata)?;
                info!(source = %metadata, items = items.len(), "Ingesting metadata");
                let report = self.builder.ingest(
                    items,
                    IngestOptions {
                        set_super: *set_super,
                    },
                )?;
                match format {
                    OutputFormat::Json => to_pretty_json(&report),
                    OutputFormat::Text => Ok(format_report_text(&report)),
                }
            }
            Commands::Key {
                dataset_id,
                dataset_version,
                children,
            } => {
                let keys = self
                    .builder
                    .keys(&DatasetRef::new(dataset_id.as_str(), dataset_version.as_str()));
                let key = if *children { keys.children } else { keys.main };
                Ok(key.to_string())
            }
            Commands::Show {
                dataset_id,
                dataset_version,
                format,
            } => {
                let format = OutputFormat::parse(format)?;
                let dataset = DatasetRef::new(dataset_id.as_str(), dataset_version.as_str());
                let node = self.builder.load_dataset(&dataset)?.ok_or_else(|| {
                    ApiError::InvalidArgument(format!("Dataset {} is not in the catalog", dataset))
                })?;
                match format {
                    OutputFormat::Json => {
                        let mut document = node.fields.clone();
                        document.insert(
                            fields::CHILDREN.to_string(),
                            serde_json::to_value(&node.children).map_err(serialization_error)?,
                        );
                        to_pretty_json(&document)
                    }
                    OutputFormat::Text => Ok(format_dataset_text(&node)),
                }
            }
            Commands::SetSuper {
                dataset_id,
                dataset_version,
            } => {
                let dataset = DatasetRef::new(dataset_id.as_str(), dataset_version.as_str());
                if !self.builder.store().exists(&self.builder.keys(&dataset).main)? {
                    tracing::warn!(dataset = %dataset, "Superdataset is not in the catalog yet");
                }
                let location = self.builder.set_super(&dataset)?;
                Ok(format!("Superdataset set to {} ({})", dataset, location))
            }
        }
    }
}

/// The single status record printed when a command fails as a whole.
pub fn render_error(command: &Commands, err: &ApiError) -> String {
    let message = err.to_string();
    let json_output = matches!(command, Commands::Add { format, .. } if format == "json");
    if json_output {
        json!({ "status": Status::Error.as_str(), "message": message }).to_string()
    } else {
        let kind = match err {
            ApiError::Ingest(IngestError::MultipleSourceDatasets { .. })
            | ApiError::Ingest(IngestError::NoSourceDataset) => "invariant violated",
            ApiError::Ingest(IngestError::Storage(_)) | ApiError::Storage(_) => "storage failure",
            ApiError::ConfigError(_) => "configuration error",
            ApiError::InvalidArgument(_) => "invalid argument",
        };
        format!("{}: {} ({})", Status::Error.as_str().red().bold(), message, kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self, ApiError> {
        match value {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApiError::InvalidArgument(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

fn read_metadata(source: &str) -> Result<Vec<InputItem>, ApiError> {
    if source == "-" {
        return read_input(std::io::stdin().lock())
            .map_err(|e| ApiError::InvalidArgument(format!("Failed to read stdin: {}", e)));
    }
    let text = std::fs::read_to_string(source).map_err(|e| {
        ApiError::InvalidArgument(format!("Failed to read metadata file {}: {}", source, e))
    })?;
    Ok(decode_stream(&text))
}

fn serialization_error(err: serde_json::Error) -> ApiError {
    ApiError::Storage(crate::error::StorageError::Serialization(err.to_string()))
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(serialization_error)
}

fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn paint_status(status: Status, text: String) -> String {
    match status {
        Status::Ok => text.green().to_string(),
        Status::Skipped => text.yellow().to_string(),
        Status::Error => text.red().to_string(),
        Status::Impossible => text.magenta().to_string(),
    }
}

fn format_report_text(report: &IngestReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Ingestion")));
    out.push_str(&format!("  Dataset: {}\n", report.dataset));
    out.push_str(&format!("  Main blob: {}\n", report.main_path));
    out.push_str(&format!("  Children blob: {}\n", report.children_path));
    if let Some(path) = &report.super_path {
        out.push_str(&format!("  Superdataset pointer: {}\n", path));
    }
    out.push_str(&format!("  Tree nodes: {}\n", report.node_count));

    let counts: Vec<String> = [Status::Ok, Status::Skipped, Status::Error, Status::Impossible]
        .into_iter()
        .map(|status| paint_status(status, format!("{} {}", report.count(status), status)))
        .collect();
    out.push_str(&format!("  Items: {}\n\n", counts.join(", ")));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Status", "Path", "Message"]);
    for status in &report.statuses {
        let mut message = status.message.clone();
        for warning in &status.warnings {
            message.push_str(&format!("\nwarning: {}", warning));
        }
        table.add_row(vec![
            status.index.to_string(),
            status.status.to_string(),
            status.path.clone().unwrap_or_else(|| "-".to_string()),
            message,
        ]);
    }
    out.push_str(&format!("{}\n", table));
    for warning in &report.warnings {
        out.push_str(&format!("warning: {}\n", warning));
    }
    out
}

fn format_dataset_text(node: &DatasetNode) -> String {
    let text = |key: &str| node.str_field(key).unwrap_or("").to_string();
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Dataset")));
    out.push_str(&format!(
        "  {}@{}\n",
        text(fields::DATASET_ID),
        text(fields::DATASET_VERSION)
    ));
    out.push_str(&format!("  Name: {}\n", text(fields::NAME)));
    out.push_str(&format!("  Short name: {}\n", text(fields::SHORT_NAME)));
    let description = text(fields::DESCRIPTION);
    if !description.is_empty() {
        out.push_str(&format!("  Description: {}\n", description));
    }
    let url = node.field(fields::URL).map(display_value).unwrap_or_default();
    if !url.is_empty() {
        out.push_str(&format!("  URL: {}\n", url));
    }
    let list_len = |key: &str| node.field(key).and_then(Value::as_array).map(Vec::len).unwrap_or(0);
    out.push_str(&format!(
        "  Authors: {}  Keywords: {}  Publications: {}  Subdatasets: {}\n\n",
        list_len(fields::AUTHORS),
        list_len("keywords"),
        list_len(fields::PUBLICATIONS),
        list_len(fields::SUBDATASETS)
    ));

    out.push_str(&format!("{}\n\n", format_section_heading("Tree")));
    if node.children.is_empty() {
        out.push_str("  (empty)\n");
    }
    for child in &node.children {
        push_tree_lines(&mut out, child, 1);
    }
    out
}

fn push_tree_lines(out: &mut String, node: &CatalogNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        CatalogNode::Directory(dir) => {
            out.push_str(&format!("{}{}/\n", indent, dir.name));
            for child in &dir.children {
                push_tree_lines(out, child, depth + 1);
            }
        }
        CatalogNode::File(file) => {
            let size = if file.content_byte_size < 0 {
                "size unknown".to_string()
            } else {
                format!("{} bytes", file.content_byte_size)
            };
            out.push_str(&format!("{}{} ({})\n", indent, file.name, size));
        }
        CatalogNode::Dataset(sub) => {
            out.push_str(&format!(
                "{}{} [dataset {}@{}]\n",
                indent, sub.name, sub.dataset_id, sub.dataset_version
            ));
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

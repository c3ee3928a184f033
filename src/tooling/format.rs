//! Format repository results as text tables or JSON.

use crate::error::ApiError;
use crate::import::ImportSummary;
use crate::repository::{FileData, FileItem};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Pretty JSON for any serializable result
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to encode JSON output: {}", e)))
}

fn size_cell(size: Option<u64>) -> String {
    size.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
}

fn optional_cell(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn modified_cell(data: &FileData) -> String {
    data.modified_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "-".to_string())
}

/// Table of summary records under a heading
pub fn format_file_list_text(title: &str, entries: &[FileData]) -> String {
    let mut out = format!("{}\n\n", format_section_heading(title));
    if entries.is_empty() {
        out.push_str("No entries.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Version", "Size", "Author", "Modified", "Comment"]);
    for data in entries {
        table.add_row(vec![
            data.name.clone(),
            optional_cell(data.version.as_deref()),
            size_cell(data.size),
            optional_cell(data.author.as_deref()),
            modified_cell(data),
            optional_cell(data.comment.as_deref()),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out.push_str(&format!("Total: {} entries.\n", entries.len()));
    out
}

/// Key/value view of a single summary record
pub fn format_file_data_text(data: &FileData) -> String {
    let mut out = format!("{}\n\n", format_section_heading(&data.name));
    out.push_str(&format!("  Version:  {}\n", optional_cell(data.version.as_deref())));
    out.push_str(&format!("  Size:     {}\n", size_cell(data.size)));
    out.push_str(&format!("  Author:   {}\n", optional_cell(data.author.as_deref())));
    out.push_str(&format!("  Modified: {}\n", modified_cell(data)));
    out.push_str(&format!("  Comment:  {}\n", optional_cell(data.comment.as_deref())));
    out.push_str(&format!("  Deleted:  {}\n", if data.deleted { "yes" } else { "no" }));
    out
}

pub fn format_not_found(name: &str) -> String {
    format!("No artifact at '{}'.", name)
}

/// Confirmation after writing an item's content to `out`
pub fn format_written(item: &FileItem, out: &Path) -> String {
    format!(
        "Wrote {} bytes of '{}' to {}",
        item.content.len(),
        item.data.name,
        out.display()
    )
}

pub fn format_import_text(summary: &ImportSummary) -> String {
    format!(
        "Imported {} folders and {} files into '{}' (revision {}).",
        summary.folders, summary.resources, summary.project, summary.revision
    )
}

//! Export display formatting

use crate::export::{ExportFile, ExportSummary};

/// Format the result of an export run
pub fn format_export_summary(summary: &ExportSummary) -> String {
    let mut output = format!(
        "Exported {} orders and {} line items to {} ({} bytes)\n",
        summary.order_rows, summary.line_item_rows, summary.file_name, summary.size_bytes
    );
    if !summary.pruned.is_empty() {
        output.push_str(&format!(
            "Removed {} old export(s): {}\n",
            summary.pruned.len(),
            summary.pruned.join(", ")
        ));
    }
    output
}

/// Format the stored export files, newest first
pub fn format_export_list(files: &[ExportFile]) -> String {
    if files.is_empty() {
        return "No exports found.\n".to_string();
    }

    let mut output = format!("{:<40}  {:<19}  {:>10}\n", "File", "Created", "Size");
    output.push_str(&"-".repeat(73));
    output.push('\n');
    for file in files {
        output.push_str(&format!(
            "{:<40}  {:<19}  {:>10}\n",
            file.name,
            file.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            file.size_bytes
        ));
    }
    output
}

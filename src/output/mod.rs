//! Output formatting and display for pdfgather.
//!
//! This module handles all user-facing output including:
//! - The list of files about to be merged
//! - Per-candidate progress lines
//! - Warnings for skipped files and pages
//! - The final summary, as text or JSON

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::discovery::Candidate;
use crate::error::{PdfGatherError, Result};
use crate::merge::{MergeEvent, MergeReport, Warning};
use crate::utils::format_file_size;

/// Create an output formatter from configuration.
pub fn create_formatter(config: &crate::config::Config) -> OutputFormatter {
    OutputFormatter::from_config(config)
}

/// List the candidates in merge order.
pub fn display_candidates(formatter: &OutputFormatter, candidates: &[Candidate]) {
    if candidates.is_empty() {
        return;
    }

    formatter.info(&format!("Files to merge ({}):", candidates.len()));
    for (index, candidate) in candidates.iter().enumerate() {
        formatter.list_item(index + 1, &candidate.display_name());
    }
    formatter.blank_line();
}

/// Print a progress event as it happens.
pub fn display_event(formatter: &OutputFormatter, event: &MergeEvent) {
    match event {
        MergeEvent::Processing { index, total, path } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            formatter.info(&format!("[{}/{}] Processing: {name}", index + 1, total));
        }
        MergeEvent::Merged(file) => {
            formatter.debug(&format!("{} page(s) from {}", file.pages, file.path.display()));
        }
        MergeEvent::Skipped(warning) => display_warning(formatter, warning),
    }
}

/// Print one warning.
pub fn display_warning(formatter: &OutputFormatter, warning: &Warning) {
    let message = match warning.page {
        Some(page) => format!(
            "{} (page {page}): {}",
            warning.path.display(),
            warning.reason
        ),
        None => format!("Skipping {}: {}", warning.path.display(), warning.reason),
    };
    formatter.warning(&message);
}

/// Print the summary of a finished run.
pub fn display_report(formatter: &OutputFormatter, report: &MergeReport) {
    formatter.blank_line();

    if !report.success {
        let reason = report.failure.as_deref().unwrap_or("no pages were merged");
        formatter.error(&format!("Merge failed: {reason}; no output written"));
        return;
    }

    let summary = format!(
        "{} page(s) from {} of {} file(s)",
        report.pages_written,
        report.merged_files.len(),
        report.candidates
    );

    if report.dry_run {
        formatter.success(&format!("Dry run: would write {summary}"));
        formatter.info(&format!("  Output would be: {}", report.output.display()));
        formatter.info("  Run without --dry-run to create the merged PDF");
    } else {
        let size = report
            .output_size
            .map(|s| format!(" ({})", format_file_size(s)))
            .unwrap_or_default();
        formatter.success(&format!(
            "Successfully created {}{size}: {summary}",
            report.output.display()
        ));
    }

    if !report.warnings.is_empty() {
        formatter.warning(&format!(
            "{} warning(s); {} file(s) skipped",
            report.warnings.len(),
            report.skipped_files()
        ));
    }

    if formatter.is_verbose() {
        formatter.section("Statistics");
        formatter.detail("Candidates", &report.candidates.to_string());
        formatter.detail("Merged files", &report.merged_files.len().to_string());
        formatter.detail("Total pages", &report.pages_written.to_string());
        formatter.detail("Warnings", &report.warnings.len().to_string());
        formatter.detail(
            "Elapsed",
            &format!("{:.2}s", report.elapsed.as_secs_f64()),
        );
    }
}

/// Render a report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn report_json(report: &MergeReport) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| PdfGatherError::other(format!("Failed to serialize report: {e}")))
}

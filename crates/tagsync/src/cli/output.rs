//! Output formatting for verify and update reports

use serde::Serialize;
use std::fmt::Write;
use tagsync::{UpdateReport, VerifyReport};

/// Human-readable verify report.
pub fn render_verify(report: &VerifyReport) -> String {
    let mut out = String::new();
    for check in &report.checked {
        let _ = writeln!(out, "Verifying {} ({}:{})...", check.component, check.image, check.tag);
    }
    for failure in &report.failures {
        let _ = writeln!(out, "Skipped {}: {}", failure.component, failure.error);
    }

    if !report.mismatches.is_empty() {
        let _ = writeln!(out, "\nVersion mismatches found:");
        for mismatch in &report.mismatches {
            let _ = writeln!(out, "  - {}", mismatch);
        }
    } else if report.failures.is_empty() {
        let _ = writeln!(out, "\nAll versions match.");
    }
    out
}

/// Human-readable update report.
pub fn render_update(report: &UpdateReport) -> String {
    let mut out = String::new();
    for component in &report.components {
        let _ = writeln!(out, "Updating {} to {}...", component.component, component.tag);
        for file in &component.files {
            let _ = writeln!(
                out,
                "Updated {} occurrence(s) in {}",
                file.occurrences,
                file.file.display()
            );
        }
        let _ = writeln!(
            out,
            "Updated {} file{} for {}.",
            component.files_modified,
            if component.files_modified == 1 { "" } else { "s" },
            component.component
        );
    }
    for failure in &report.failures {
        let _ = writeln!(out, "Skipped {}: {}", failure.component, failure.error);
    }
    out
}

/// Pretty-print any report as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

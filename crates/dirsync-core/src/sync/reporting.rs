//! Reconciliation reporting

use std::fmt::Write;

use super::ReconcileReport;

/// Renders a [`ReconcileReport`] for humans
pub struct SyncReporter;

impl SyncReporter {
    /// Generate a summary report
    #[must_use]
    pub fn generate_summary(report: &ReconcileReport) -> String {
        let mut output = String::new();

        // Writing to a String cannot fail
        let _ = writeln!(output, "\n=== Initial Sync Summary ===");
        let _ = writeln!(output, "Copied:     {} ({} bytes)", report.copied, report.bytes_copied);
        let _ = writeln!(output, "Linked:     {}", report.linked);
        let _ = writeln!(output, "Unchanged:  {}", report.unchanged);
        let _ = writeln!(output, "New dirs:   {}", report.directories_created);
        let _ = writeln!(output, "Excluded:   {}", report.excluded);
        let _ = writeln!(output, "Vanished:   {}", report.vanished);
        if report.unsupported > 0 {
            let _ = writeln!(output, "Unsupported: {}", report.unsupported);
        }

        if !report.errors.is_empty() {
            let _ = writeln!(output, "\nErrors ({}):", report.errors.len());
            for error in &report.errors {
                let _ = writeln!(output, "  - {error}");
            }
        }

        let _ = writeln!(output, "\nTotal operations: {}", report.total_operations());

        if report.is_success() {
            output.push_str("Status: ✓ Success\n");
        } else {
            output.push_str("Status: ✗ Completed with errors\n");
        }

        output
    }
}

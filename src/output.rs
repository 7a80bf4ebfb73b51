//! CLI output formatting for all pipeline stages.
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! ## Plan
//!
//! ```text
//! Axes
//!     inner: 5 values
//!     outer: 9 values
//!     font: 6 values
//!
//! Combinations (270)
//!     [done] default/default/default
//!     [part] default/default/professionalfonts
//!     [    ] default/default/serif
//!
//! 1 of 270 built, 1 partial
//! ```
//!
//! ## Build
//!
//! ```text
//! ==> Building 270 combinations
//!     001/270 default/default/default
//!         source: built
//!         compile: built
//!         images: built
//!     002/270 default/default/professionalfonts
//!         compile failed for default/default/professionalfonts: pdflatex exited with code 1
//!
//! 269 built, 1 failed (270 attempted)
//! ```

use crate::axes::AxisSet;
use crate::build::ArtifactStatus;
use crate::grid::Combination;
use crate::pipeline::{PipelineEvent, RunSummary};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

// ============================================================================
// Plan
// ============================================================================

/// Status marker for the plan listing.
fn status_marker(status: ArtifactStatus) -> &'static str {
    match status {
        ArtifactStatus::Complete => "done",
        ArtifactStatus::Partial => "part",
        ArtifactStatus::Missing => "    ",
    }
}

/// Format the combination grid with per-combination artifact status.
pub fn format_plan_output(
    axes: &AxisSet,
    entries: &[(Combination, ArtifactStatus)],
) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Axes".to_string());
    for axis in axes.axes() {
        lines.push(format!("    {}: {} values", axis.name, axis.values.len()));
    }
    lines.push(String::new());

    lines.push(format!("Combinations ({})", entries.len()));
    for (combination, status) in entries {
        lines.push(format!(
            "    [{}] {}",
            status_marker(*status),
            combination.label()
        ));
    }
    lines.push(String::new());

    let complete = entries
        .iter()
        .filter(|(_, s)| *s == ArtifactStatus::Complete)
        .count();
    let partial = entries
        .iter()
        .filter(|(_, s)| *s == ArtifactStatus::Partial)
        .count();
    let mut tally = format!("{} of {} built", complete, entries.len());
    if partial > 0 {
        tally.push_str(&format!(", {partial} partial"));
    }
    lines.push(tally);

    lines
}

pub fn print_plan_output(axes: &AxisSet, entries: &[(Combination, ArtifactStatus)]) {
    for line in format_plan_output(axes, entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Build progress
// ============================================================================

/// Format a single pipeline progress event as display lines.
pub fn format_pipeline_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::Started { total } => {
            vec![format!("==> Building {} combinations", total)]
        }
        PipelineEvent::Combination {
            index,
            total,
            label,
            source,
            compile,
            rasterize,
        } => vec![
            format!("    {}/{} {}", format_index(*index), total, label),
            format!("        source: {}", source),
            format!("        compile: {}", compile),
            format!("        images: {}", rasterize),
        ],
        PipelineEvent::Failed {
            index,
            total,
            label,
            error,
        } => vec![
            format!("    {}/{} {}", format_index(*index), total, label),
            format!("        {}", error),
        ],
    }
}

pub fn print_pipeline_event(event: &PipelineEvent) {
    for line in format_pipeline_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Run summary
// ============================================================================

/// Format the end-of-run summary, including the failure list.
pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![String::new()];
    if summary.is_clean() {
        lines.push(format!("All {} combinations built", summary.attempted));
    } else {
        lines.push(format!(
            "{} built, {} failed ({} attempted)",
            summary.succeeded,
            summary.failed(),
            summary.attempted
        ));
        lines.push("Failed combinations:".to_string());
        for failure in &summary.failures {
            let stage = failure.stage.as_deref().unwrap_or("build");
            lines.push(format!(
                "    {} ({}): {}",
                failure.combination, stage, failure.error
            ));
        }
    }
    lines
}

pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        println!("{}", line);
    }
}

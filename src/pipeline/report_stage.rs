//! Report output stage.

use super::{should_use_color, write_output, DiffOutcome, OutputTarget, PipelineError};
use crate::config::DiffConfig;
use crate::reports::{create_reporter_with_options, ReportConfig, ReportMetadata};
use anyhow::Result;

/// Report settings for a diff run.
#[must_use]
pub fn build_report_config(config: &DiffConfig) -> ReportConfig {
    ReportConfig {
        max_items: config.output.max_items,
        show_line_numbers: config.line_numbers,
        title: None,
        metadata: ReportMetadata {
            original_path: Some(config.paths.original.display().to_string()),
            modified_path: Some(config.paths.modified.display().to_string()),
            ..ReportMetadata::new()
        },
    }
}

/// Render the report in the configured format and write it out.
pub fn output_report(config: &DiffConfig, outcome: &DiffOutcome<'_>) -> Result<()> {
    let target = OutputTarget::from_option(config.output.file.clone());
    let use_color = should_use_color(config.output.no_color, &target);
    let reporter = create_reporter_with_options(config.output.format, use_color);

    let report = reporter
        .generate_diff_report(&outcome.session, &build_report_config(config))
        .map_err(|e| PipelineError::ReportFailed { source: e.into() })?;

    write_output(&report, &target, config.behavior.quiet)
}

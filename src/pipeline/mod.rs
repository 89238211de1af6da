//! Pipeline orchestration for policy comparisons.
//!
//! This module provides the shared parse → diff → report workflow used by
//! the CLI command handlers.

mod diff_stage;
mod output;
mod parse;
mod report_stage;

pub use diff_stage::{check_rename_names, compute_diff, DiffOutcome};
pub use output::{should_use_color, write_output, OutputTarget};
pub use parse::{parse_policy_pair, parse_policy_with_context};
pub use report_stage::{build_report_config, output_report};

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to read or parse a policy file
    #[error("Parse failed for {path}: {source}")]
    ParseFailed {
        path: String,
        source: anyhow::Error,
    },

    /// A rename declaration names a type the policy does not have
    #[error("{0}")]
    UnknownRename(String),

    /// Diff computation failed
    #[error("Diff failed: {source}")]
    DiffFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Report generation or output failed
    #[error("Report failed: {source}")]
    ReportFailed {
        #[source]
        source: anyhow::Error,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success - no differences found (or --fail-on-change not set)
    pub const SUCCESS: i32 = 0;
    /// Differences were found and --fail-on-change was set
    pub const CHANGES_DETECTED: i32 = 1;
    /// An error occurred
    pub const ERROR: i32 = 3;

    /// Exit code for a finished comparison.
    #[must_use]
    pub const fn for_differences(total: usize, fail_on_change: bool) -> i32 {
        if fail_on_change && total > 0 {
            CHANGES_DETECTED
        } else {
            SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_values() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::CHANGES_DETECTED, 1);
        assert_eq!(exit_codes::ERROR, 3);
    }

    #[test]
    fn test_exit_code_for_differences() {
        assert_eq!(exit_codes::for_differences(0, true), exit_codes::SUCCESS);
        assert_eq!(exit_codes::for_differences(4, false), exit_codes::SUCCESS);
        assert_eq!(
            exit_codes::for_differences(4, true),
            exit_codes::CHANGES_DETECTED
        );
    }
}

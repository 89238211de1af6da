//! Diff command handler.
//!
//! Implements the `diff` subcommand for comparing two policies.

use crate::config::{DiffConfig, Validatable};
use crate::pipeline::{compute_diff, exit_codes, output_report, parse_policy_pair};
use anyhow::{bail, Result};

/// Run the diff command, returning the desired exit code.
///
/// The caller is responsible for calling `std::process::exit()` with the
/// returned code when it is non-zero.
#[allow(clippy::needless_pass_by_value)]
pub fn run_diff(config: DiffConfig) -> Result<i32> {
    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid diff configuration:\n  {}", details.join("\n  "));
    }

    let quiet = config.behavior.quiet;
    let (original, modified) = parse_policy_pair(&config.paths, quiet)?;

    let outcome = compute_diff(&config, &original, &modified)?;
    output_report(&config, &outcome)?;

    if let Some(failure) = &outcome.failure {
        tracing::error!("{failure}");
        return Ok(exit_codes::ERROR);
    }

    let total = outcome.total_differences();
    if !quiet {
        tracing::info!("{total} differences found");
    }
    Ok(exit_codes::for_differences(total, config.behavior.fail_on_change))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, DiffPaths};
    use tempfile::TempDir;

    const ORIGINAL: &str = "name: orig\ntypes:\n  - name: a_t\n";
    const MODIFIED: &str = "name: mod\ntypes:\n  - name: a_t\n  - name: b_t\n";

    fn config(tmp: &TempDir, app: &AppConfig) -> DiffConfig {
        let original = tmp.path().join("orig.yaml");
        let modified = tmp.path().join("mod.yaml");
        std::fs::write(&original, ORIGINAL).unwrap();
        std::fs::write(&modified, MODIFIED).unwrap();
        DiffConfig::from_app_config(DiffPaths { original, modified }, app)
    }

    #[test]
    fn test_exit_code_with_fail_on_change() {
        let tmp = TempDir::new().unwrap();
        let app = AppConfig::builder()
            .fail_on_change(true)
            .quiet(true)
            .output_file(Some(tmp.path().join("out.txt")))
            .build();
        assert_eq!(run_diff(config(&tmp, &app)).unwrap(), exit_codes::CHANGES_DETECTED);
    }

    #[test]
    fn test_exit_code_without_fail_on_change() {
        let tmp = TempDir::new().unwrap();
        let app = AppConfig::builder()
            .quiet(true)
            .output_file(Some(tmp.path().join("out.txt")))
            .build();
        assert_eq!(run_diff(config(&tmp, &app)).unwrap(), exit_codes::SUCCESS);
        let report = std::fs::read_to_string(tmp.path().join("out.txt")).unwrap();
        assert!(report.contains("+ b_t"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let app = AppConfig::builder()
            .rename("a_t", "b_t")
            .rename("a_t", "c_t")
            .build();
        let err = run_diff(config(&tmp, &app)).unwrap_err();
        assert!(err.to_string().contains("renamed twice"));
    }
}

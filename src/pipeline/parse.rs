//! Policy loading stage.

use super::PipelineError;
use crate::config::DiffPaths;
use crate::model::Policy;
use anyhow::Result;
use std::path::Path;

/// Parse a policy with the path in every error message.
pub fn parse_policy_with_context(path: &Path, quiet: bool) -> Result<Policy> {
    if !quiet {
        tracing::info!("Parsing policy: {}", path.display());
    }

    let policy = crate::parsers::parse_policy(path).map_err(|e| PipelineError::ParseFailed {
        path: path.display().to_string(),
        source: e.into(),
    })?;

    if !quiet {
        tracing::info!(
            "Parsed policy '{}': {} types, {} access vector rules, {} type rules{}",
            policy.name(),
            policy.type_count(),
            policy.av_rules().len(),
            policy.te_rules().len(),
            if policy.is_mls() { ", MLS" } else { "" }
        );
    }

    Ok(policy)
}

/// Parse the original and modified policies.
pub fn parse_policy_pair(paths: &DiffPaths, quiet: bool) -> Result<(Policy, Policy)> {
    let original = parse_policy_with_context(&paths.original, quiet)?;
    let modified = parse_policy_with_context(&paths.modified, quiet)?;
    Ok((original, modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_error_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.yaml");
        std::fs::write(&path, "name: broken\ntypes: [[[").unwrap();
        let err = parse_policy_with_context(&path, true).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_missing_file() {
        let paths = DiffPaths {
            original: "/nonexistent/a.yaml".into(),
            modified: "/nonexistent/b.yaml".into(),
        };
        let err = parse_policy_pair(&paths, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ParseFailed { .. })
        ));
    }
}

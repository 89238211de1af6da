//! Diff computation stage.
//!
//! Checks rename declarations against both policies, builds the session,
//! runs the selected categories and annotates rule items with source lines.

use super::PipelineError;
use crate::config::DiffConfig;
use crate::diff::{CategoryMask, DiffSession, TypeRename};
use crate::error::PolDiffError;
use crate::model::Policy;
use anyhow::{Context, Result};
use std::fmt::Write;
use strsim::jaro_winkler;

/// Minimum similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A finished comparison.
///
/// A failing category does not stop the others; the first failure is kept
/// so the caller can report what ran and still exit with an error.
#[derive(Debug)]
pub struct DiffOutcome<'p> {
    pub session: DiffSession<'p>,
    pub failure: Option<PolDiffError>,
}

impl DiffOutcome<'_> {
    /// Total differences across every category that ran.
    #[must_use]
    pub fn total_differences(&self) -> usize {
        self.session.stats_for(CategoryMask::ALL).total()
    }
}

/// Closest primary type name in `policy`, if any is similar enough.
fn suggest_type(policy: &Policy, name: &str) -> Option<String> {
    policy
        .types()
        .map(|(_, t)| (jaro_winkler(name, &t.name), &t.name))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, n)| n.clone())
}

fn check_name(policy: &Policy, side: &str, name: &str) -> Option<String> {
    if policy.primary_type(name).is_some() {
        return None;
    }
    let mut message = if policy.is_alias(name) {
        format!("'{name}' is an alias in the {side} policy, renames need primary type names")
    } else if policy.is_attribute(name) {
        format!("'{name}' is an attribute in the {side} policy, renames need primary type names")
    } else {
        format!("unknown type '{name}' in the {side} policy")
    };
    if let Some(suggestion) = suggest_type(policy, name) {
        let _ = write!(message, " (did you mean '{suggestion}'?)");
    }
    Some(message)
}

/// Check that every rename names a primary type on its side.
///
/// All problems are collected into one error, each with a suggestion when a
/// similarly named type exists.
pub fn check_rename_names(
    original: &Policy,
    modified: &Policy,
    renames: &[TypeRename],
) -> Result<(), PipelineError> {
    let problems: Vec<String> = renames
        .iter()
        .flat_map(|r| {
            [
                check_name(original, "original", &r.original),
                check_name(modified, "modified", &r.modified),
            ]
        })
        .flatten()
        .collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::UnknownRename(problems.join("; ")))
    }
}

/// Run the comparison described by `config`.
pub fn compute_diff<'p>(
    config: &DiffConfig,
    original: &'p Policy,
    modified: &'p Policy,
) -> Result<DiffOutcome<'p>> {
    let quiet = config.behavior.quiet;

    check_rename_names(original, modified, &config.renames)?;

    let mut session = DiffSession::new(original, modified, &config.renames)
        .map_err(|e| PipelineError::DiffFailed { source: e.into() })?;

    if !quiet {
        tracing::info!(
            "Comparing {} categories of '{}' and '{}'",
            config.mask.categories().count(),
            original.name(),
            modified.name()
        );
    }

    let failure = match session.run(config.mask) {
        Ok(()) => None,
        Err(err @ PolDiffError::Category { .. }) => {
            tracing::warn!("Continuing with the categories that succeeded: {err}");
            Some(err)
        }
        Err(err) => return Err(PipelineError::DiffFailed { source: err.into() }.into()),
    };

    if config.line_numbers {
        let (orig_table, mod_table) = (original.syntax(), modified.syntax());
        if orig_table.is_empty() && mod_table.is_empty() && !quiet {
            tracing::warn!("Line numbers requested but neither policy carries source rules");
        }
        let annotated: Vec<_> = config
            .mask
            .categories()
            .filter(|c| c.supports_line_numbers() && session.summary(*c).is_some())
            .collect();
        for category in annotated {
            session
                .enable_line_numbers(category, orig_table, mod_table)
                .with_context(|| format!("annotating {category} with line numbers"))?;
        }
    }

    if let Some(map) = session.built_type_map() {
        if !quiet {
            tracing::info!(
                "Type map: {} pseudo types, {} remap entries",
                map.len(),
                map.entries().len()
            );
        }
    }

    Ok(DiffOutcome { session, failure })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, DiffPaths};
    use crate::diff::{Category, DiffForm};
    use crate::model::PolicyBuilder;

    fn policies() -> (Policy, Policy) {
        let orig = PolicyBuilder::new("orig")
            .class("file", None, &["read"])
            .type_("httpd_t", &[])
            .type_("httpd_sys_content_t", &[])
            .allow("httpd_t", "httpd_sys_content_t", "file", &["read"])
            .build()
            .unwrap();
        let modified = PolicyBuilder::new("mod")
            .class("file", None, &["read"])
            .type_("httpd_t", &[])
            .type_("httpd_content_t", &[])
            .allow("httpd_t", "httpd_content_t", "file", &["read"])
            .build()
            .unwrap();
        (orig, modified)
    }

    fn config(app: &AppConfig) -> DiffConfig {
        DiffConfig::from_app_config(
            DiffPaths {
                original: "orig.yaml".into(),
                modified: "mod.yaml".into(),
            },
            app,
        )
    }

    #[test]
    fn test_rename_removes_differences() {
        let (orig, modified) = policies();
        let without = compute_diff(&config(&AppConfig::default()), &orig, &modified).unwrap();
        assert!(without.total_differences() > 0);

        let app = AppConfig::builder()
            .rename("httpd_sys_content_t", "httpd_content_t")
            .build();
        let with = compute_diff(&config(&app), &orig, &modified).unwrap();
        assert_eq!(with.total_differences(), 0);
        assert!(with.failure.is_none());
    }

    #[test]
    fn test_unknown_rename_suggests() {
        let (orig, modified) = policies();
        let app = AppConfig::builder()
            .rename("httpd_sys_content", "httpd_content_t")
            .build();
        let err = compute_diff(&config(&app), &orig, &modified).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown type 'httpd_sys_content'"));
        assert!(message.contains("did you mean 'httpd_sys_content_t'?"));
    }

    #[test]
    fn test_no_suggestion_for_unrelated_name() {
        let (orig, _) = policies();
        assert_eq!(suggest_type(&orig, "zzzz"), None);
    }

    #[test]
    fn test_selected_categories_only() {
        let (orig, modified) = policies();
        let app = AppConfig::builder().categories([Category::Types]).build();
        let outcome = compute_diff(&config(&app), &orig, &modified).unwrap();
        assert_eq!(outcome.session.summaries().count(), 1);
        let stats = outcome.session.stats(Category::Types).unwrap();
        assert_eq!((stats.added, stats.removed, stats.modified), (1, 1, 0));
        assert!(outcome
            .session
            .items(Category::Types)
            .iter()
            .all(|i| matches!(i.form(), DiffForm::Added | DiffForm::Removed)));
    }
}

//! Validate command handler.
//!
//! Implements the `validate` subcommand: load one or more policy documents,
//! report what they declare and point out declarations that can never
//! contribute to a comparison.

use crate::model::Policy;
use crate::pipeline::{parse_policy_with_context, write_output, OutputTarget};
use crate::reports::ReportFormat;
use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::PathBuf;

/// What a policy declares.
#[derive(Debug, Serialize)]
struct PolicySummary {
    path: String,
    name: String,
    fingerprint: String,
    mls: bool,
    counts: SymbolCounts,
    warnings: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
struct SymbolCounts {
    commons: usize,
    classes: usize,
    attributes: usize,
    types: usize,
    aliases: usize,
    roles: usize,
    users: usize,
    booleans: usize,
    sensitivities: usize,
    categories: usize,
    av_rules: usize,
    te_rules: usize,
    role_allows: usize,
    role_transitions: usize,
    range_transitions: usize,
    source_rules: usize,
}

impl SymbolCounts {
    fn of(policy: &Policy) -> Self {
        Self {
            commons: policy.commons().count(),
            classes: policy.classes().count(),
            attributes: policy.attributes().count(),
            types: policy.type_count(),
            aliases: policy.types().map(|(_, t)| t.aliases.len()).sum(),
            roles: policy.roles().count(),
            users: policy.users().count(),
            booleans: policy.booleans().count(),
            sensitivities: policy.sensitivities().count(),
            categories: policy.categories().count(),
            av_rules: policy.av_rules().len(),
            te_rules: policy.te_rules().len(),
            role_allows: policy.role_allows().len(),
            role_transitions: policy.role_transitions().len(),
            range_transitions: policy.range_transitions().len(),
            source_rules: policy.syntax().len(),
        }
    }

    fn rows(&self) -> [(&'static str, usize); 16] {
        [
            ("Commons", self.commons),
            ("Classes", self.classes),
            ("Attributes", self.attributes),
            ("Types", self.types),
            ("Aliases", self.aliases),
            ("Roles", self.roles),
            ("Users", self.users),
            ("Booleans", self.booleans),
            ("Sensitivities", self.sensitivities),
            ("Categories", self.categories),
            ("Access vector rules", self.av_rules),
            ("Type rules", self.te_rules),
            ("Role allow rules", self.role_allows),
            ("Role transitions", self.role_transitions),
            ("Range transitions", self.range_transitions),
            ("Source rules", self.source_rules),
        ]
    }
}

/// Declarations that are legal but inert.
fn lint(policy: &Policy) -> Vec<String> {
    let mut warnings = Vec::new();

    for attribute in policy.attributes().filter(|a| a.members.is_empty()) {
        warnings.push(format!(
            "attribute '{}' has no member types; rules using it expand to nothing",
            attribute.name
        ));
    }

    let used: BTreeSet<String> = policy
        .av_rules()
        .iter()
        .filter_map(|r| r.cond.as_ref())
        .chain(policy.te_rules().iter().filter_map(|r| r.cond.as_ref()))
        .flat_map(|c| c.expr.booleans())
        .collect();
    for boolean in policy.booleans().filter(|b| !used.contains(&b.name)) {
        warnings.push(format!(
            "boolean '{}' is not used by any conditional rule",
            boolean.name
        ));
    }

    if !policy.is_mls() && policy.sensitivities().next().is_some() {
        warnings.push("sensitivities are declared but MLS is disabled".to_string());
    }

    warnings
}

fn summarize(path: &std::path::Path, policy: &Policy) -> PolicySummary {
    PolicySummary {
        path: path.display().to_string(),
        name: policy.name().to_string(),
        fingerprint: format!("{:016x}", policy.fingerprint()),
        mls: policy.is_mls(),
        counts: SymbolCounts::of(policy),
        warnings: lint(policy),
    }
}

fn format_text(summaries: &[PolicySummary]) -> String {
    let mut out = String::new();
    for (i, summary) in summaries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{} ({}): valid, {}MLS, fingerprint {}",
            summary.path,
            summary.name,
            if summary.mls { "" } else { "non-" },
            summary.fingerprint
        );
        for (label, count) in summary.counts.rows() {
            let _ = writeln!(out, "   {label:<20} {count}");
        }
        for warning in &summary.warnings {
            let _ = writeln!(out, "   warning: {warning}");
        }
    }
    out
}

/// Run the validate command, returning the desired exit code.
///
/// Returns 1 when `fail_on_warning` is set and any policy has warnings.
#[allow(clippy::needless_pass_by_value)]
pub fn run_validate(
    paths: Vec<PathBuf>,
    output: ReportFormat,
    output_file: Option<PathBuf>,
    fail_on_warning: bool,
) -> Result<i32> {
    let mut summaries = Vec::with_capacity(paths.len());
    for path in &paths {
        let policy = parse_policy_with_context(path, true)?;
        summaries.push(summarize(path, &policy));
    }

    let content = match output {
        ReportFormat::Json => serde_json::to_string_pretty(&summaries)
            .map_err(|e| anyhow::anyhow!("Failed to serialize validation JSON: {e}"))?,
        ReportFormat::Text | ReportFormat::Summary => format_text(&summaries),
        ReportFormat::Markdown => bail!("validate supports text and json output"),
    };
    write_output(&content, &OutputTarget::from_option(output_file), true)?;

    let warned = summaries.iter().any(|s| !s.warnings.is_empty());
    Ok(if fail_on_warning && warned {
        crate::pipeline::exit_codes::CHANGES_DETECTED
    } else {
        crate::pipeline::exit_codes::SUCCESS
    })
}

//! Source line annotation for access vector and type rule differences.
//!
//! A semantic rule may come from several rules in policy source (an allow on
//! an attribute plus another on one of its members, for example). Given the
//! syntactic rule table of each policy, every AV or TE item is annotated with
//! the lines of the source rules that contribute to it. Annotation never
//! changes how an item is classified.

use super::categories::{cond_key, AvRuleDiff, TeRuleDiff};
use super::traits::DiffContext;
use super::type_map::{PseudoValue, Side};
use super::{Category, CategorySummary, DiffItem};
use crate::error::{ErrorContext, PolDiffError, Result};
use crate::model::{CondKey, RuleKind, SyntacticRule, SyntaxTable, SELF_TARGET};
use serde::Serialize;
use std::collections::BTreeSet;

/// One contributing source rule of an access vector item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineAnnotation {
    pub line: u64,
    /// Permissions of the item this source rule grants
    pub perms: Vec<String>,
}

/// A syntactic rule with its type sets resolved to pseudo values.
#[derive(Debug)]
struct ExpandedRule<'t> {
    rule: &'t SyntacticRule,
    sources: BTreeSet<PseudoValue>,
    targets: BTreeSet<PseudoValue>,
    self_target: bool,
    cond: Option<CondKey>,
    default: Option<PseudoValue>,
}

impl ExpandedRule<'_> {
    fn covers(&self, source: PseudoValue, target: PseudoValue, class: &str, cond: Option<&CondKey>) -> bool {
        self.sources.contains(&source)
            && (self.targets.contains(&target) || (self.self_target && source == target))
            && self.rule.classes.iter().any(|c| c == class)
            && self.cond.as_ref() == cond
    }
}

fn expand_names(
    ctx: &DiffContext<'_>,
    side: Side,
    names: &[String],
    out: &mut BTreeSet<PseudoValue>,
) -> Result<bool> {
    let policy = ctx.policy(side);
    let mut has_self = false;
    for name in names {
        if name == SELF_TARGET {
            has_self = true;
            continue;
        }
        for id in policy.expand_type_set(name)? {
            out.insert(ctx.type_map.map_to_pseudo(id, side)?);
        }
    }
    Ok(has_self)
}

fn expand_table<'t>(
    ctx: &DiffContext<'_>,
    side: Side,
    table: &'t SyntaxTable,
    kind: RuleKind,
) -> Result<Vec<ExpandedRule<'t>>> {
    let policy = ctx.policy(side);
    table
        .rules_of_kind(kind)
        .map(|rule| {
            let context = || format!("source rule at line {}", rule.line);
            let mut sources = BTreeSet::new();
            expand_names(ctx, side, &rule.sources, &mut sources).with_context(context)?;
            let mut targets = BTreeSet::new();
            let self_target = expand_names(ctx, side, &rule.targets, &mut targets).with_context(context)?;
            let cond = cond_key(rule.cond.as_ref()).with_context(context)?;
            let default = match &rule.default {
                Some(name) => {
                    let id = policy.single_type(name).with_context(context)?;
                    Some(ctx.type_map.map_to_pseudo(id, side)?)
                }
                None => None,
            };
            Ok(ExpandedRule {
                rule,
                sources,
                targets,
                self_target,
                cond,
                default,
            })
        })
        .collect()
}

fn side_table<'t>(side: Side, orig: &'t SyntaxTable, modified: &'t SyntaxTable) -> &'t SyntaxTable {
    match side {
        Side::Original => orig,
        Side::Modified => modified,
    }
}

/// Annotate every item of a rule category with source lines.
///
/// Existing annotations are replaced, so annotating twice gives the same
/// result as annotating once.
pub(crate) fn annotate(
    summary: &mut CategorySummary,
    ctx: &DiffContext<'_>,
    orig_table: &SyntaxTable,
    mod_table: &SyntaxTable,
) -> Result<()> {
    let category = summary.category;
    let kind = rule_kind(category)?;
    let mut expanded = Vec::with_capacity(2);
    for side in [Side::Original, Side::Modified] {
        expanded.push(
            expand_table(ctx, side, side_table(side, orig_table, mod_table), kind)
                .with_context(|| format!("{category} line numbers"))?,
        );
    }
    let (orig_rules, mod_rules) = (&expanded[0], &expanded[1]);

    let mut annotated = 0usize;
    for item in &mut summary.items {
        match item {
            DiffItem::AvRule(av) => {
                av.orig_lines = av_lines(orig_rules, av, Side::Original);
                av.mod_lines = av_lines(mod_rules, av, Side::Modified);
                annotated += usize::from(!av.orig_lines.is_empty() || !av.mod_lines.is_empty());
            }
            DiffItem::TeRule(te) => {
                te.orig_lines = te_lines(orig_rules, te, Side::Original);
                te.mod_lines = te_lines(mod_rules, te, Side::Modified);
                annotated += usize::from(!te.orig_lines.is_empty() || !te.mod_lines.is_empty());
            }
            _ => {}
        }
    }
    tracing::debug!(
        "{}: annotated {} of {} items with source lines",
        category,
        annotated,
        summary.items.len()
    );
    Ok(())
}

/// Drop the source lines of every item in `summary`.
pub(crate) fn clear_annotations(summary: &mut CategorySummary) {
    for item in &mut summary.items {
        match item {
            DiffItem::AvRule(av) => {
                av.orig_lines.clear();
                av.mod_lines.clear();
            }
            DiffItem::TeRule(te) => {
                te.orig_lines.clear();
                te.mod_lines.clear();
            }
            _ => {}
        }
    }
}

fn rule_kind(category: Category) -> Result<RuleKind> {
    category
        .av_kind()
        .map(RuleKind::Av)
        .or_else(|| category.te_kind().map(RuleKind::Te))
        .ok_or_else(|| {
            PolDiffError::invalid_argument(format!("{category} does not support line numbers"))
        })
}

fn av_lines(rules: &[ExpandedRule<'_>], item: &AvRuleDiff, side: Side) -> Vec<LineAnnotation> {
    let perms = item.perms_on(side);
    if perms.is_empty() {
        return Vec::new();
    }
    let key = &item.key;
    let mut lines: Vec<LineAnnotation> = rules
        .iter()
        .filter(|r| r.covers(key.source, key.target, &key.class, key.cond.as_ref()))
        .filter_map(|r| {
            let granted: Vec<String> = perms
                .iter()
                .filter(|p| r.rule.perms.contains(*p))
                .cloned()
                .collect();
            (!granted.is_empty()).then(|| LineAnnotation {
                line: r.rule.line,
                perms: granted,
            })
        })
        .collect();
    lines.sort_by_key(|a| a.line);
    lines.dedup_by_key(|a| a.line);
    lines
}

fn te_lines(rules: &[ExpandedRule<'_>], item: &TeRuleDiff, side: Side) -> Vec<u64> {
    let Some(default) = item.default_on(side) else {
        return Vec::new();
    };
    let key = &item.key;
    let mut lines: Vec<u64> = rules
        .iter()
        .filter(|r| r.covers(key.source, key.target, &key.class, key.cond.as_ref()))
        .filter(|r| r.default == Some(default))
        .map(|r| r.rule.line)
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

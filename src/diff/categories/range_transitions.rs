//! Range transition rules, keyed by source type, target type and class.

use super::range::RangeDiff;
use super::rule_key::{classify_by_types, naming_side};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::{PseudoValue, Side};
use crate::diff::{Category, DiffForm};
use crate::error::{ErrorContext, Result};
use crate::model::MlsRange;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

type RangeKey = (PseudoValue, PseudoValue, String);

#[derive(Debug, Clone)]
pub struct CanonicalRangeTrans {
    source: PseudoValue,
    target: PseudoValue,
    class: String,
    range: MlsRange,
}

impl CanonicalRangeTrans {
    fn key(&self) -> (PseudoValue, PseudoValue, &str) {
        (self.source, self.target, &self.class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeTransDiff {
    pub source: String,
    pub target: String,
    pub class: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_range: Option<MlsRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_range: Option<MlsRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_diff: Option<RangeDiff>,
}

impl fmt::Display for RangeTransDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} range_transition {} {} : {}",
            self.form.symbol(),
            self.source,
            self.target,
            self.class
        )?;
        if let Some(diff) = &self.range_diff {
            for line in diff.lines() {
                write!(f, "\n{line}")?;
            }
            return Ok(());
        }
        if let Some(range) = self.orig_range.as_ref().or(self.mod_range.as_ref()) {
            write!(f, " {range}")?;
        }
        f.write_str(";")
    }
}

pub struct RangeTransitionsDiffer;

impl CategoryDiffer for RangeTransitionsDiffer {
    type Canonical = CanonicalRangeTrans;
    type Diff = RangeTransDiff;

    fn category(&self) -> Category {
        Category::RangeTransitions
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalRangeTrans>> {
        let policy = ctx.policy(side);
        let map = ctx.type_map;
        let mut merged: BTreeMap<RangeKey, MlsRange> = BTreeMap::new();
        for rule in policy.range_transitions() {
            let context = || format!("range_transition {} {} : {}", rule.source, rule.target, rule.class);
            let sources = policy.expand_type_set(&rule.source).with_context(context)?;
            let targets = policy.expand_type_set(&rule.target).with_context(context)?;
            for s in &sources {
                let source = map.map_to_pseudo(*s, side)?;
                for t in &targets {
                    let target = map.map_to_pseudo(*t, side)?;
                    merged
                        .entry((source, target, rule.class.clone()))
                        .or_insert_with(|| rule.range.clone());
                }
            }
        }
        Ok(merged
            .into_iter()
            .map(|((source, target, class), range)| CanonicalRangeTrans {
                source,
                target,
                class,
                range,
            })
            .collect())
    }

    fn compare_key(&self, a: &CanonicalRangeTrans, b: &CanonicalRangeTrans) -> Ordering {
        a.key().cmp(&b.key())
    }

    fn classify(&self, ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalRangeTrans) -> DiffForm {
        classify_by_types(ctx, form, &[item.source, item.target])
    }

    fn one_sided(
        &self,
        ctx: &DiffContext<'_>,
        form: DiffForm,
        item: &CanonicalRangeTrans,
    ) -> Result<RangeTransDiff> {
        let side = naming_side(form);
        let (orig_range, mod_range) = if form.is_added() {
            (None, Some(item.range.clone()))
        } else {
            (Some(item.range.clone()), None)
        };
        Ok(RangeTransDiff {
            source: ctx.type_map.name_of(item.source, side),
            target: ctx.type_map.name_of(item.target, side),
            class: item.class.clone(),
            form,
            orig_range,
            mod_range,
            range_diff: None,
        })
    }

    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &CanonicalRangeTrans,
        modified: &CanonicalRangeTrans,
    ) -> Result<Option<RangeTransDiff>> {
        let Some(range_diff) =
            RangeDiff::compute(ctx.original, &original.range, ctx.modified, &modified.range)
        else {
            return Ok(None);
        };
        Ok(Some(RangeTransDiff {
            source: ctx.type_map.name_of(original.source, Side::Original),
            target: ctx.type_map.name_of(original.target, Side::Original),
            class: original.class.clone(),
            form: DiffForm::Modified,
            orig_range: Some(original.range.clone()),
            mod_range: Some(modified.range.clone()),
            range_diff: Some(range_diff),
        }))
    }
}

//! Keys and expansion shared by the type-keyed rule categories.

use crate::diff::traits::DiffContext;
use crate::diff::type_map::{PseudoValue, Side};
use crate::diff::DiffForm;
use crate::error::{PolDiffError, Result};
use crate::model::{CondKey, RuleCondition, SELF_TARGET};
use serde::Serialize;

/// Identity of a semantic access vector or type rule.
///
/// Unconditional rules (`cond == None`) order before conditional ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RuleKey {
    pub source: PseudoValue,
    pub target: PseudoValue,
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<CondKey>,
}

/// Expand a rule's source and target into pseudo type pairs.
///
/// Attributes expand to their members (an empty attribute yields no pairs)
/// and a `self` target pairs each source type with itself.
pub(crate) fn expand_pairs(
    ctx: &DiffContext<'_>,
    side: Side,
    source: &str,
    target: &str,
) -> Result<Vec<(PseudoValue, PseudoValue)>> {
    let policy = ctx.policy(side);
    let map = ctx.type_map;
    let sources = policy.expand_type_set(source)?;
    let targets = if target == SELF_TARGET {
        Vec::new()
    } else {
        policy.expand_type_set(target)?
    };

    let mut pairs = Vec::with_capacity(sources.len() * targets.len().max(1));
    for s in &sources {
        let s_pseudo = map.map_to_pseudo(*s, side)?;
        if target == SELF_TARGET {
            pairs.push((s_pseudo, s_pseudo));
            continue;
        }
        for t in &targets {
            pairs.push((s_pseudo, map.map_to_pseudo(*t, side)?));
        }
    }
    Ok(pairs)
}

/// Normalized identity of an optional rule condition.
pub(crate) fn cond_key(cond: Option<&RuleCondition>) -> Result<Option<CondKey>> {
    cond.map(|c| {
        c.key()
            .map_err(|kind| PolDiffError::policy_query(format!("condition {c}"), kind))
    })
    .transpose()
}

/// `Added`/`Removed` become the `DueToType` forms when a referenced type is
/// missing from the other policy.
pub(crate) fn classify_by_types(ctx: &DiffContext<'_>, form: DiffForm, types: &[PseudoValue]) -> DiffForm {
    let map = ctx.type_map;
    match form {
        DiffForm::Added if types.iter().any(|p| map.is_hole(*p, Side::Original)) => {
            DiffForm::AddedDueToType
        }
        DiffForm::Removed if types.iter().any(|p| map.is_hole(*p, Side::Modified)) => {
            DiffForm::RemovedDueToType
        }
        other => other,
    }
}

/// The side whose names describe an item of the given form.
pub(crate) const fn naming_side(form: DiffForm) -> Side {
    if form.is_added() {
        Side::Modified
    } else {
        Side::Original
    }
}

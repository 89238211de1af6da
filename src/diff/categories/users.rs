//! Users: permitted roles, and on MLS policies the default level and range.

use super::levels::LevelDiff;
use super::range::RangeDiff;
use super::{count_phrase, normalized, partition};
use crate::diff::traits::{CategoryDiffer, DiffContext};
use crate::diff::type_map::Side;
use crate::diff::{Category, DiffForm};
use crate::error::Result;
use crate::model::{Level, MlsRange};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub struct CanonicalUser {
    name: String,
    roles: Vec<String>,
    default_level: Option<Level>,
    range: Option<MlsRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDiff {
    pub name: String,
    pub form: DiffForm,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_roles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_roles: Vec<String>,
    /// Empty, one modified level, or a removed and an added level when the
    /// sensitivity changed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub default_level: Vec<LevelDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeDiff>,
}

fn compare_default_levels(original: Option<&Level>, modified: Option<&Level>) -> Vec<LevelDiff> {
    match (original, modified) {
        (Some(o), Some(m)) if o.sensitivity == m.sensitivity => {
            LevelDiff::compare(o, m).into_iter().collect()
        }
        (Some(o), Some(m)) => vec![
            LevelDiff::one_sided(o, DiffForm::Removed),
            LevelDiff::one_sided(m, DiffForm::Added),
        ],
        (Some(o), None) => vec![LevelDiff::one_sided(o, DiffForm::Removed)],
        (None, Some(m)) => vec![LevelDiff::one_sided(m, DiffForm::Added)],
        (None, None) => Vec::new(),
    }
}

impl fmt::Display for UserDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.form.symbol(), self.name)?;
        if self.form != DiffForm::Modified {
            return Ok(());
        }
        let mut parts = Vec::new();
        if !self.added_roles.is_empty() {
            parts.push(count_phrase(self.added_roles.len(), "Added", "Role"));
        }
        if !self.removed_roles.is_empty() {
            parts.push(count_phrase(self.removed_roles.len(), "Removed", "Role"));
        }
        if !self.default_level.is_empty() {
            parts.push("Modified Default Level".to_string());
        }
        if self.range.is_some() {
            parts.push("Modified Range".to_string());
        }
        write!(f, " ({})", parts.join(", "))?;
        for role in &self.added_roles {
            write!(f, "\n\t+ {role}")?;
        }
        for role in &self.removed_roles {
            write!(f, "\n\t- {role}")?;
        }
        if !self.default_level.is_empty() {
            f.write_str("\n   level:")?;
            for level in &self.default_level {
                write!(f, "\n     {}", level.compact())?;
            }
        }
        if let Some(range) = &self.range {
            for line in range.lines() {
                write!(f, "\n{line}")?;
            }
        }
        Ok(())
    }
}

pub struct UsersDiffer;

impl CategoryDiffer for UsersDiffer {
    type Canonical = CanonicalUser;
    type Diff = UserDiff;

    fn category(&self) -> Category {
        Category::Users
    }

    fn canonicalize(&self, ctx: &DiffContext<'_>, side: Side) -> Result<Vec<CanonicalUser>> {
        Ok(ctx
            .policy(side)
            .users()
            .map(|u| CanonicalUser {
                name: u.name.clone(),
                roles: normalized(u.roles.clone()),
                default_level: u.default_level.clone(),
                range: u.range.clone(),
            })
            .collect())
    }

    fn compare_key(&self, a: &CanonicalUser, b: &CanonicalUser) -> Ordering {
        a.name.cmp(&b.name)
    }

    fn one_sided(&self, _ctx: &DiffContext<'_>, form: DiffForm, item: &CanonicalUser) -> Result<UserDiff> {
        Ok(UserDiff {
            name: item.name.clone(),
            form,
            added_roles: Vec::new(),
            removed_roles: Vec::new(),
            default_level: Vec::new(),
            range: None,
        })
    }

    fn deep_compare(
        &self,
        ctx: &DiffContext<'_>,
        original: &CanonicalUser,
        modified: &CanonicalUser,
    ) -> Result<Option<UserDiff>> {
        let roles = partition(&original.roles, &modified.roles);
        let default_level =
            compare_default_levels(original.default_level.as_ref(), modified.default_level.as_ref());
        let range = match (&original.range, &modified.range) {
            (Some(o), Some(m)) => RangeDiff::compute(ctx.original, o, ctx.modified, m),
            (Some(o), None) => Some(RangeDiff::one_sided(ctx.original, o, DiffForm::Removed)),
            (None, Some(m)) => Some(RangeDiff::one_sided(ctx.modified, m, DiffForm::Added)),
            (None, None) => None,
        };
        if roles.is_unchanged() && default_level.is_empty() && range.is_none() {
            return Ok(None);
        }
        Ok(Some(UserDiff {
            name: original.name.clone(),
            form: DiffForm::Modified,
            added_roles: roles.added,
            removed_roles: roles.removed,
            default_level,
            range,
        }))
    }
}

//! Multi-level security levels and ranges.
//!
//! Levels are written the way policy sources write them: a sensitivity,
//! optionally followed by a comma-separated category list where `a.b`
//! denotes every category declared between `a` and `b` inclusive
//! (`"s0:c0.c3,c7"`). Ranges are `"low - high"`; a single level is a range
//! whose low and high are equal.
//!
//! The `*Expr` types are the unresolved document form. They are resolved
//! against a policy's category order into [`Level`] and [`MlsRange`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One category reference inside a level expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategorySpec {
    /// A single category name
    Single(String),
    /// An inclusive span `first.last`
    Span(String, String),
}

/// Unresolved MLS level, e.g. `s0:c0.c3,c5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LevelExpr {
    pub sensitivity: String,
    pub categories: Vec<CategorySpec>,
}

impl FromStr for LevelExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sens, cats) = match s.split_once(':') {
            Some((sens, cats)) => (sens.trim(), Some(cats.trim())),
            None => (s, None),
        };
        if sens.is_empty() || !is_symbol_name(sens) {
            return Err(format!("invalid sensitivity '{sens}'"));
        }

        let mut categories = Vec::new();
        if let Some(cats) = cats {
            if cats.is_empty() {
                return Err("empty category list".to_string());
            }
            for part in cats.split(',') {
                let part = part.trim();
                let spec = match part.split_once('.') {
                    Some((first, last)) => {
                        let (first, last) = (first.trim(), last.trim());
                        if !is_symbol_name(first) || !is_symbol_name(last) {
                            return Err(format!("invalid category span '{part}'"));
                        }
                        CategorySpec::Span(first.to_string(), last.to_string())
                    }
                    None if is_symbol_name(part) => CategorySpec::Single(part.to_string()),
                    None => return Err(format!("invalid category '{part}'")),
                };
                categories.push(spec);
            }
        }

        Ok(Self {
            sensitivity: sens.to_string(),
            categories,
        })
    }
}

impl TryFrom<String> for LevelExpr {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LevelExpr> for String {
    fn from(value: LevelExpr) -> Self {
        value.to_string()
    }
}

impl fmt::Display for LevelExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sensitivity)?;
        for (i, spec) in self.categories.iter().enumerate() {
            f.write_str(if i == 0 { ":" } else { "," })?;
            match spec {
                CategorySpec::Single(c) => write!(f, "{c}")?,
                CategorySpec::Span(a, b) => write!(f, "{a}.{b}")?,
            }
        }
        Ok(())
    }
}

/// Unresolved MLS range, e.g. `s0 - s1:c0.c3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RangeExpr {
    pub low: LevelExpr,
    pub high: LevelExpr,
}

impl FromStr for RangeExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((low, high)) => Ok(Self {
                low: low.parse()?,
                high: high.parse()?,
            }),
            None => {
                let level: LevelExpr = s.parse()?;
                Ok(Self {
                    low: level.clone(),
                    high: level,
                })
            }
        }
    }
}

impl TryFrom<String> for RangeExpr {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RangeExpr> for String {
    fn from(value: RangeExpr) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RangeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{} - {}", self.low, self.high)
        }
    }
}

fn is_symbol_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A resolved MLS level: categories are expanded and kept in policy order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level {
    pub sensitivity: String,
    pub categories: Vec<String>,
}

impl Level {
    #[must_use]
    pub fn new(sensitivity: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            sensitivity: sensitivity.into(),
            categories,
        }
    }

    /// Whether every category of `other` is also in `self`.
    #[must_use]
    pub fn covers_categories(&self, other: &Self) -> bool {
        other
            .categories
            .iter()
            .all(|c| self.categories.contains(c))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sensitivity)?;
        if !self.categories.is_empty() {
            write!(f, ":{}", self.categories.join(","))?;
        }
        Ok(())
    }
}

/// A resolved MLS range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MlsRange {
    pub low: Level,
    pub high: Level,
}

impl fmt::Display for MlsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{} - {}", self.low, self.high)
        }
    }
}

/// How one level relates to another under the dominance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelDominance {
    Equal,
    Dominates,
    DominatedBy,
    Incomparable,
}

/// Compare two levels given each side's sensitivity rank.
///
/// `a` dominates `b` when its sensitivity is at least as high and its
/// category set is a superset.
#[must_use]
pub fn compare_levels(a: &Level, a_rank: usize, b: &Level, b_rank: usize) -> LevelDominance {
    let a_covers = a.covers_categories(b);
    let b_covers = b.covers_categories(a);
    match a_rank.cmp(&b_rank) {
        Ordering::Equal if a_covers && b_covers => LevelDominance::Equal,
        Ordering::Equal | Ordering::Greater if a_covers => LevelDominance::Dominates,
        Ordering::Equal | Ordering::Less if b_covers => LevelDominance::DominatedBy,
        _ => LevelDominance::Incomparable,
    }
}

//! Conditional (boolean) expressions guarding policy rules.
//!
//! Expressions are stored in reverse-polish order, exactly as the kernel
//! policy format keeps them: `["allow_ftp", "allow_nfs", "||"]`.
//! Two expressions are semantically identical when they reference the same
//! booleans and have the same truth table, which is how rules from two
//! policies are matched regardless of how the expression was written.

use crate::error::PolicyQueryKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest number of distinct booleans a truth table can describe.
pub const MAX_COND_BOOLS: usize = 5;

/// One token of a reverse-polish conditional expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CondToken {
    Bool(String),
    Not,
    And,
    Or,
    Xor,
    Eq,
    Neq,
}

impl CondToken {
    fn parse(token: &str) -> Self {
        match token {
            "!" | "not" => Self::Not,
            "&&" | "and" => Self::And,
            "||" | "or" => Self::Or,
            "^" | "xor" => Self::Xor,
            "==" | "eq" => Self::Eq,
            "!=" | "neq" => Self::Neq,
            name => Self::Bool(name.to_string()),
        }
    }

    const fn symbol(&self) -> Option<&'static str> {
        match self {
            Self::Bool(_) => None,
            Self::Not => Some("!"),
            Self::And => Some("&&"),
            Self::Or => Some("||"),
            Self::Xor => Some("^"),
            Self::Eq => Some("=="),
            Self::Neq => Some("!="),
        }
    }
}

/// A validated reverse-polish conditional expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CondExpr {
    tokens: Vec<CondToken>,
}

impl CondExpr {
    /// Parse and validate a token list.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, String> {
        let tokens: Vec<CondToken> = tokens.iter().map(|t| CondToken::parse(t.as_ref())).collect();
        let mut depth: usize = 0;
        for token in &tokens {
            match token {
                CondToken::Bool(name) => {
                    if name.is_empty() {
                        return Err("empty boolean name".to_string());
                    }
                    depth += 1;
                }
                CondToken::Not => {
                    if depth < 1 {
                        return Err("'!' without an operand".to_string());
                    }
                }
                op => {
                    if depth < 2 {
                        return Err(format!(
                            "'{}' needs two operands",
                            op.symbol().unwrap_or_default()
                        ));
                    }
                    depth -= 1;
                }
            }
        }
        if depth != 1 {
            return Err(format!(
                "expression leaves {depth} values on the stack, expected 1"
            ));
        }
        Ok(Self { tokens })
    }

    /// Distinct boolean names, sorted.
    #[must_use]
    pub fn booleans(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tokens
            .iter()
            .filter_map(|t| match t {
                CondToken::Bool(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Evaluate with `value(name)` giving each boolean's state.
    fn evaluate(&self, value: impl Fn(&str) -> bool) -> bool {
        let mut stack: Vec<bool> = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            let result = match token {
                CondToken::Bool(name) => value(name),
                CondToken::Not => {
                    let a = stack.pop().unwrap_or(false);
                    !a
                }
                op => {
                    let b = stack.pop().unwrap_or(false);
                    let a = stack.pop().unwrap_or(false);
                    match op {
                        CondToken::And => a && b,
                        CondToken::Or => a || b,
                        CondToken::Xor => a ^ b,
                        CondToken::Eq => a == b,
                        _ => a != b,
                    }
                }
            };
            stack.push(result);
        }
        stack.pop().unwrap_or(false)
    }

    /// Compute the truth table over [`CondExpr::booleans`].
    ///
    /// Bit `i` of the result is the value of the expression when boolean `j`
    /// (in sorted order) is set to bit `j` of `i`.
    pub fn truth_table(&self) -> Result<(Vec<String>, u32), PolicyQueryKind> {
        let names = self.booleans();
        if names.len() > MAX_COND_BOOLS {
            return Err(PolicyQueryKind::TooManyBooleans(names.len()));
        }
        let mut table = 0u32;
        for row in 0..(1u32 << names.len()) {
            let value = |name: &str| {
                names
                    .iter()
                    .position(|n| n == name)
                    .is_some_and(|j| row & (1 << j) != 0)
            };
            if self.evaluate(value) {
                table |= 1 << row;
            }
        }
        Ok((names, table))
    }
}

impl TryFrom<Vec<String>> for CondExpr {
    type Error = String;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CondExpr> for Vec<String> {
    fn from(value: CondExpr) -> Self {
        value
            .tokens
            .iter()
            .map(|t| match t {
                CondToken::Bool(name) => name.clone(),
                op => op.symbol().unwrap_or_default().to_string(),
            })
            .collect()
    }
}

impl fmt::Display for CondExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match token {
                CondToken::Bool(name) => f.write_str(name)?,
                op => f.write_str(op.symbol().unwrap_or_default())?,
            }
        }
        Ok(())
    }
}

fn default_branch() -> bool {
    true
}

/// The conditional block a rule lives in: an expression and which branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleCondition {
    pub expr: CondExpr,
    /// `true` for the if-branch, `false` for the else-branch
    #[serde(default = "default_branch")]
    pub branch: bool,
}

/// Policy-independent identity of a rule's conditional block.
///
/// The table is normalized to describe when the rule is *active*, so a rule
/// in the else-branch of `a` is identical to one in the if-branch of `!a`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CondKey {
    pub booleans: Vec<String>,
    pub truth_table: u32,
}

impl RuleCondition {
    /// Compute the normalized identity of this condition.
    pub fn key(&self) -> Result<CondKey, PolicyQueryKind> {
        let (booleans, table) = self.expr.truth_table()?;
        let truth_table = if self.branch {
            table
        } else {
            !table & row_mask(booleans.len())
        };
        Ok(CondKey {
            booleans,
            truth_table,
        })
    }
}

const fn row_mask(bools: usize) -> u32 {
    let rows = 1u64 << (1u64 << bools);
    (rows - 1) as u32
}

impl fmt::Display for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]:{}",
            self.expr,
            if self.branch { "TRUE" } else { "FALSE" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(tokens: &[&str]) -> CondExpr {
        CondExpr::parse(tokens).unwrap()
    }

    #[test]
    fn test_parse_rejects_unbalanced() {
        assert!(CondExpr::parse(&["a", "&&"]).is_err());
        assert!(CondExpr::parse(&["a", "b"]).is_err());
        assert!(CondExpr::parse(&["!"]).is_err());
        assert!(CondExpr::parse::<&str>(&[]).is_err());
    }

    #[test]
    fn test_truth_table_single_bool() {
        let (names, table) = expr(&["a"]).truth_table().unwrap();
        assert_eq!(names, vec!["a"]);
        assert_eq!(table, 0b10);

        let (_, negated) = expr(&["a", "!"]).truth_table().unwrap();
        assert_eq!(negated, 0b01);
    }

    #[test]
    fn test_equivalent_expressions_share_key() {
        let written_one_way = RuleCondition {
            expr: expr(&["b", "a", "&&"]),
            branch: true,
        };
        let written_another = RuleCondition {
            expr: expr(&["a", "b", "&&"]),
            branch: true,
        };
        assert_eq!(
            written_one_way.key().unwrap(),
            written_another.key().unwrap()
        );
    }

    #[test]
    fn test_else_branch_matches_negated_expression() {
        let else_branch = RuleCondition {
            expr: expr(&["a", "b", "||"]),
            branch: false,
        };
        let negated = RuleCondition {
            expr: expr(&["a", "b", "||", "!"]),
            branch: true,
        };
        assert_eq!(else_branch.key().unwrap(), negated.key().unwrap());
    }

    #[test]
    fn test_too_many_booleans() {
        let tokens = ["a", "b", "&&", "c", "&&", "d", "&&", "e", "&&", "f", "&&"];
        assert_eq!(
            expr(&tokens).truth_table(),
            Err(PolicyQueryKind::TooManyBooleans(6))
        );
    }

    #[test]
    fn test_display_round_trip_tokens() {
        let cond = RuleCondition {
            expr: expr(&["allow_ftp", "allow_nfs", "||"]),
            branch: false,
        };
        assert_eq!(cond.to_string(), "[allow_ftp allow_nfs ||]:FALSE");
        let tokens: Vec<String> = cond.expr.into();
        assert_eq!(tokens, vec!["allow_ftp", "allow_nfs", "||"]);
    }
}

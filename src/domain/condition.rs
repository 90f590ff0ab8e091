//! Typed branch-condition language.
//!
//! Condition links carry a [`ConditionExpr`]: either the unconditional
//! default branch, or a predicate list that must all hold (logical AND) for
//! some stored field value of the entry. Operands stay data, never query
//! text.

use serde::{Deserialize, Serialize};

/// Comparison operators available to branch predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    #[serde(alias = "=", alias = "==")]
    Eq,
    #[serde(alias = "!=", alias = "<>")]
    Ne,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = ">=")]
    Ge,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = "<=")]
    Le,
}

/// A single comparison against the node's configured expression field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub op: CompareOp,
    pub value: String,
}

/// Branch expression carried by a `Condition` link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionExpr {
    /// Always matches; the default branch, typically ordered last.
    Always,
    /// Matches when every predicate holds for the same stored field value.
    All(Vec<Predicate>),
}

impl ConditionExpr {
    pub fn all(predicates: Vec<Predicate>) -> Self {
        ConditionExpr::All(predicates)
    }
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_serde_round_trip() {
        let expr = ConditionExpr::all(vec![
            Predicate::new("amount", CompareOp::Gt, "100"),
            Predicate::new("amount", CompareOp::Le, "500"),
        ]);
        let json = serde_json::to_string(&expr).unwrap();
        let back: ConditionExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }

    #[test]
    fn test_operator_aliases() {
        let p: Predicate = serde_json::from_str(r#"{"field":"n","op":">=","value":"3"}"#).unwrap();
        assert_eq!(p.op, CompareOp::Ge);
        let p: Predicate = serde_json::from_str(r#"{"field":"n","op":"=","value":"3"}"#).unwrap();
        assert_eq!(p.op, CompareOp::Eq);
    }
}

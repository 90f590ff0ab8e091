//! Comparison primitives over stored field values.
//!
//! Entry data is stored as strings. Comparison coerces both sides the way
//! the original storage-backed evaluation did: numeric when both sides parse
//! as numbers, calendar when both parse as `%Y-%m-%d` dates, lexical
//! otherwise.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::domain::CompareOp;

/// Evaluate `stored ⟨op⟩ operand`.
pub fn compare(stored: &str, op: CompareOp, operand: &str) -> bool {
    let ord = coerced_ordering(stored, operand);
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
    }
}

fn coerced_ordering(left: &str, right: &str) -> Ordering {
    let left = left.trim();
    let right = right.trim();

    if let (Some(a), Some(b)) = (to_f64(left), to_f64(right)) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    if let (Some(a), Some(b)) = (to_date(left), to_date(right)) {
        return a.cmp(&b);
    }
    left.cmp(right)
}

fn to_f64(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn to_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_comparison() {
        assert!(compare("10", CompareOp::Gt, "9"));
        assert!(compare("10", CompareOp::Gt, "9.5"));
        assert!(!compare("2", CompareOp::Gt, "10"));
        assert!(compare("3.0", CompareOp::Eq, "3"));
        assert!(compare("3", CompareOp::Le, "3"));
        assert!(compare("-1", CompareOp::Lt, "0"));
    }

    #[test]
    fn test_string_falls_back_to_lexical() {
        // "2" vs "10" lexically would be Greater; numeric coercion must win.
        assert!(compare("2", CompareOp::Lt, "10"));
        assert!(compare("apple", CompareOp::Lt, "banana"));
        assert!(compare("apple", CompareOp::Eq, "apple"));
    }

    #[test]
    fn test_date_comparison() {
        assert!(compare("2024-03-01", CompareOp::Lt, "2024-12-31"));
        assert!(compare("2024-03-01", CompareOp::Eq, "2024-03-01"));
        assert!(compare("2025-01-01", CompareOp::Ge, "2024-12-31"));
    }

    #[test]
    fn test_mixed_types_compare_lexically() {
        // One side date, one side word: neither coercion applies.
        assert!(compare("2024-03-01", CompareOp::Lt, "abc"));
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert!(compare(" 42 ", CompareOp::Eq, "42"));
    }
}

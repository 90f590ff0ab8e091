//! First-match selection among a node's outgoing `Condition` links.

use crate::domain::{ConditionExpr, EntryData, Flowlink};
use crate::error::{EngineError, EngineResult};

use super::operators;

/// Pick the first link in `sort` order whose expression is satisfied by the
/// entry's stored field values.
///
/// `expression_field` is the node's configured comparison field; every
/// predicate must reference it. `rows` are all stored values for the entry;
/// a predicate list matches when any row for that field satisfies the whole
/// list.
///
/// Fails fatally when a condition link carries no expression, when a
/// predicate names a different field, or when no link matches.
pub fn select_link<'a>(
    links: &'a [Flowlink],
    expression_field: Option<&str>,
    rows: &[EntryData],
) -> EngineResult<&'a Flowlink> {
    let mut ordered: Vec<&Flowlink> = links.iter().collect();
    ordered.sort_by_key(|l| l.sort);

    for link in ordered {
        let expr = link
            .expression
            .as_ref()
            .ok_or(EngineError::ConditionNotConfigured(link.id))?;
        match expr {
            ConditionExpr::Always => return Ok(link),
            ConditionExpr::All(predicates) => {
                if predicates.is_empty() {
                    return Err(EngineError::ConditionNotConfigured(link.id));
                }
                let field = expression_field.ok_or(EngineError::ConditionNotConfigured(link.id))?;
                for predicate in predicates {
                    if predicate.field != field {
                        return Err(EngineError::UnknownConditionField {
                            expected: field.to_string(),
                            found: predicate.field.clone(),
                        });
                    }
                }
                let satisfied = rows
                    .iter()
                    .filter(|row| row.field_name == field)
                    .any(|row| {
                        predicates
                            .iter()
                            .all(|p| operators::compare(&row.field_value, p.op, &p.value))
                    });
                if satisfied {
                    return Ok(link);
                }
            }
        }
    }

    let node = links.first().map(|l| l.process_id).unwrap_or_default();
    Err(EngineError::NoMatchingTransition(node))
}

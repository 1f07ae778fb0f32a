//! Attribute filter builder: comparison predicates to term/range clauses.

use serde_json::json;

use crate::clause::Clause;
use crate::error::DataError;
use crate::models::AttributePredicate;

/// Builds one clause per attribute predicate.
///
/// Operator filing: `>`, `<`, `>=`, `<=` and `<==>` (between) become range
/// clauses and `==` a term clause, all under the equivalent bucket; `!=`
/// becomes a term clause under the exclude bucket. Any other operator, or a
/// predicate missing its value(s), aborts the whole set with
/// [`DataError::InvalidAttributeOperator`] — no partial clause list is ever
/// returned.
pub fn build_attribute_clauses(
    predicates: &[AttributePredicate],
) -> Result<Vec<Clause>, DataError> {
    predicates.iter().map(build_one).collect()
}

fn build_one(predicate: &AttributePredicate) -> Result<Clause, DataError> {
    let attribute = predicate.attribute.as_str();
    let operator = predicate.operator.as_str();

    let clause = match operator {
        ">" => Clause::equivalent(range(attribute, "gt", single_value(predicate)?)),
        "<" => Clause::equivalent(range(attribute, "lt", single_value(predicate)?)),
        ">=" => Clause::equivalent(range(attribute, "gte", single_value(predicate)?)),
        "<=" => Clause::equivalent(range(attribute, "lte", single_value(predicate)?)),
        "==" => Clause::equivalent(term(attribute, single_value(predicate)?)),
        "!=" => Clause::exclude(term(attribute, single_value(predicate)?)),
        "<==>" => {
            let (lower, upper) = bounds(predicate)?;
            Clause::equivalent(json!({
                "range": { attribute: { "gte": lower, "lte": upper } }
            }))
        }
        other => return Err(DataError::InvalidAttributeOperator(other.to_string())),
    };
    Ok(clause)
}

fn single_value(predicate: &AttributePredicate) -> Result<&str, DataError> {
    predicate
        .value
        .as_deref()
        .ok_or_else(|| decode_failure(predicate))
}

fn bounds(predicate: &AttributePredicate) -> Result<(&str, &str), DataError> {
    match (predicate.value_lower.as_deref(), predicate.value_upper.as_deref()) {
        (Some(lower), Some(upper)) => Ok((lower, upper)),
        _ => Err(decode_failure(predicate)),
    }
}

fn decode_failure(predicate: &AttributePredicate) -> DataError {
    DataError::InvalidAttributeOperator(format!(
        "failed to decode attribute predicate on '{}'",
        predicate.attribute
    ))
}

fn range(attribute: &str, bound: &str, value: &str) -> serde_json::Value {
    json!({ "range": { attribute: { bound: value } } })
}

fn term(attribute: &str, value: &str) -> serde_json::Value {
    json!({ "term": { attribute: { "value": value } } })
}

//! Filter expression evaluator: single comparisons and AND/OR composites
use crate::core::record::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use strum::Display;

/// The fixed operator set of the wire grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
}

/// One field comparison. The value keeps its wire type; the evaluator
/// coerces the record side toward it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

/// AND/OR combinator for a comparison list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Logic {
    #[default]
    And,
    Or,
}

/// A boolean combination of comparisons. An empty filter list matches
/// nothing under either logic: "no criteria given" is not "all match".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeCondition {
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub filters: Vec<Comparison>,
}

/// Evaluate one comparison against a record. Unknown fields never match.
pub fn matches(record: &Record, comparison: &Comparison) -> bool {
    let Some(actual) = record.get(&comparison.field) else {
        return false;
    };
    match comparison.operator {
        Operator::Eq => equals(&actual, &comparison.value).unwrap_or(false),
        Operator::Neq => equals(&actual, &comparison.value)
            .map(|eq| !eq)
            .unwrap_or(false),
        Operator::Gt => ordering(&actual, &comparison.value)
            .map(|ord| ord == Ordering::Greater)
            .unwrap_or(false),
        Operator::Gte => ordering(&actual, &comparison.value)
            .map(|ord| ord != Ordering::Less)
            .unwrap_or(false),
        Operator::Lt => ordering(&actual, &comparison.value)
            .map(|ord| ord == Ordering::Less)
            .unwrap_or(false),
        Operator::Lte => ordering(&actual, &comparison.value)
            .map(|ord| ord != Ordering::Greater)
            .unwrap_or(false),
        Operator::Contains => text_op(&actual, &comparison.value, |hay, needle| {
            hay.contains(needle)
        }),
        Operator::StartsWith => text_op(&actual, &comparison.value, |hay, needle| {
            hay.starts_with(needle)
        }),
        Operator::EndsWith => text_op(&actual, &comparison.value, |hay, needle| {
            hay.ends_with(needle)
        }),
    }
}

/// Evaluate a composite. Empty filter lists are vacuously false.
pub fn matches_composite(record: &Record, condition: &CompositeCondition) -> bool {
    if condition.filters.is_empty() {
        return false;
    }
    match condition.logic {
        Logic::And => condition.filters.iter().all(|f| matches(record, f)),
        Logic::Or => condition.filters.iter().any(|f| matches(record, f)),
    }
}

/// Equality under the declared-type coercion policy: the record value is
/// coerced to the comparison value's type; `None` marks a failed coercion,
/// which the caller turns into `false` for every operator.
fn equals(actual: &FieldValue, expected: &Value) -> Option<bool> {
    match expected {
        Value::Bool(b) => actual.as_bool().map(|a| a == *b),
        Value::Number(n) => {
            let expected = n.as_f64()?;
            actual.as_number().map(|a| a == expected)
        }
        Value::String(s) => actual.as_text().map(|a| a == *s),
        _ => None,
    }
}

/// Ordering for the relational operators: numeric first, then calendar
/// dates; anything else has no defined order.
fn ordering(actual: &FieldValue, expected: &Value) -> Option<Ordering> {
    if let (Some(a), Some(e)) = (actual.as_number(), value_number(expected)) {
        return a.partial_cmp(&e);
    }
    if let (Some(a), Some(e)) = (actual.as_date(), value_date(expected)) {
        return Some(a.cmp(&e));
    }
    None
}

fn text_op(actual: &FieldValue, expected: &Value, op: impl Fn(&str, &str) -> bool) -> bool {
    let Some(hay) = actual.as_text() else {
        return false;
    };
    let needle = match expected {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return false,
    };
    op(&hay.to_lowercase(), &needle.to_lowercase())
}

fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_date(value: &Value) -> Option<chrono::NaiveDate> {
    match value {
        Value::String(s) => FieldValue::Text(s.clone()).as_date(),
        _ => None,
    }
}

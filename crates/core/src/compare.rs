// SPDX-License-Identifier: MIT

//! Shared condition/value comparison semantics.
//!
//! Used by both the rule engine's condition matcher and the drift scanner's
//! state-to-finding mapping, so the two places that compare a captured value
//! against an expected one agree on what "equal" means: numeric types
//! (int, float, integer-as-string) normalize before equality/ordering,
//! booleans compare specifically, everything else falls back to string form.

use crate::rule::Operator;
use serde_json::Value;

/// Evaluates `operator` against `actual` (the value extracted from captured
/// data) and `comparand` (the rule- or check-supplied expectation).
/// `comparand` is `None` only for `Exists`.
pub fn evaluate(operator: Operator, actual: Option<&Value>, comparand: Option<&Value>) -> bool {
    if operator == Operator::Exists {
        return actual.is_some();
    }

    let (Some(actual), Some(comparand)) = (actual, comparand) else {
        return false;
    };

    match operator {
        Operator::Exists => unreachable!("handled above"),
        Operator::Eq => values_equal(actual, comparand),
        Operator::Ne => !values_equal(actual, comparand),
        Operator::Contains => contains(actual, comparand),
        Operator::Regex => regex_matches(actual, comparand),
        Operator::Gt => numeric_cmp(actual, comparand).is_some_and(|o| o == std::cmp::Ordering::Greater),
        Operator::Lt => numeric_cmp(actual, comparand).is_some_and(|o| o == std::cmp::Ordering::Less),
        Operator::In => in_list(actual, comparand),
        Operator::NotIn => !in_list(actual, comparand),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn as_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Value::Bool(x), Value::Bool(y)) = (a, b) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return (x - y).abs() < f64::EPSILON;
    }
    as_display_string(a) == as_display_string(b)
}

fn numeric_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    as_f64(a)?.partial_cmp(&as_f64(b)?)
}

fn contains(actual: &Value, comparand: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| values_equal(item, comparand)),
        Value::String(s) => s.contains(&as_display_string(comparand)),
        _ => false,
    }
}

fn in_list(actual: &Value, comparand: &Value) -> bool {
    match comparand {
        Value::Array(items) => items.iter().any(|item| values_equal(item, actual)),
        _ => values_equal(actual, comparand),
    }
}

fn regex_matches(actual: &Value, comparand: &Value) -> bool {
    let Value::String(pattern) = comparand else { return false };
    let haystack = as_display_string(actual);
    regex::Regex::new(pattern).map(|re| re.is_match(&haystack)).unwrap_or(false)
}

#[cfg(test)]
#[path = "compare_tests.rs"]
mod tests;

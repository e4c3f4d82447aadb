//! Leaf validators: arbitrary predicates, type-tag checks, and the derived
//! primitives built from them (numeric comparisons, pattern tests,
//! constants, enumerations).
//!
//! Everything here is sugar over `Condition` and `Every`; nothing introduces
//! a new runtime variant.

use std::sync::Arc;

use regex::Regex;

use crate::combinators::every;
use crate::schema::{Kind, Schema, SchemaError};
use crate::value::{Value, ValueType};

/// The plainest schema: passes iff the predicate holds.
pub fn condition(predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Schema {
    Schema::new("Condition", Kind::Condition(Arc::new(predicate)))
}

/// Type-tag check. Arrays are not objects, null is neither.
pub fn of_type(ty: ValueType) -> Schema {
    condition(move |v| v.type_of() == ty)
        .retag("OfType")
        .with_label(ty.as_str())
}

pub fn number() -> Schema {
    // NaN is a number.
    of_type(ValueType::Number).retag("Number")
}

pub fn string() -> Schema {
    of_type(ValueType::String).retag("String")
}

pub fn boolean() -> Schema {
    of_type(ValueType::Boolean).retag("Boolean")
}

/// A number with no fractional part. NaN and the infinities fail
/// (`x % 1` is NaN for all three); -0 and 0 both pass.
pub fn integer() -> Schema {
    every(vec![
        number(),
        condition(|v| matches!(v, Value::Number(n) if *n % 1.0 == 0.0)),
    ])
    .retag("Integer")
    .with_label("an integer")
}

/// Strictly greater than `lower_bound`.
pub fn greater_than(lower_bound: impl Into<f64>) -> Schema {
    let lower_bound = lower_bound.into();
    every(vec![
        number(),
        condition(move |v| matches!(v, Value::Number(n) if lower_bound < *n)),
    ])
    .retag("GreaterThan")
    .with_label(format!("> {lower_bound}"))
}

pub fn greater_than_equal(lower_bound: impl Into<f64>) -> Schema {
    let lower_bound = lower_bound.into();
    every(vec![
        number(),
        condition(move |v| matches!(v, Value::Number(n) if lower_bound <= *n)),
    ])
    .retag("GreaterThanEqual")
    .with_label(format!(">= {lower_bound}"))
}

pub fn less_than(upper_bound: impl Into<f64>) -> Schema {
    let upper_bound = upper_bound.into();
    every(vec![
        number(),
        condition(move |v| matches!(v, Value::Number(n) if *n < upper_bound)),
    ])
    .retag("LessThan")
    .with_label(format!("< {upper_bound}"))
}

pub fn less_than_equal(upper_bound: impl Into<f64>) -> Schema {
    let upper_bound = upper_bound.into();
    every(vec![
        number(),
        condition(move |v| matches!(v, Value::Number(n) if *n <= upper_bound)),
    ])
    .retag("LessThanEqual")
    .with_label(format!("<= {upper_bound}"))
}

/// A string matching `source`, compiled here. An invalid pattern is a
/// construction-time error, never a validation failure.
pub fn pattern(source: &str) -> Result<Schema, SchemaError> {
    Ok(pattern_regex(Regex::new(source)?))
}

/// A string matching a precompiled regex. Unanchored, like `Regex::is_match`.
pub fn pattern_regex(re: Regex) -> Schema {
    let label = re.as_str().to_string();
    every(vec![
        string(),
        condition(move |v| matches!(v, Value::String(s) if re.is_match(s))),
    ])
    .retag("Test")
    .with_label(label)
}

/// Passes iff the value strictly equals `value`. No coercion: `1` is not
/// `"1"`, and `constant(f64::NAN)` never matches anything.
pub fn constant(value: impl Into<Value>) -> Schema {
    let value = value.into();
    let label = format!("exactly {value}");
    condition(move |v| *v == value)
        .retag("Constant")
        .with_label(label)
}

/// Set membership by strict equality. An empty list always fails: there is
/// no value it could accept.
pub fn one_of<I, V>(values: I) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    let label = format!(
        "one of [{}]",
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    condition(move |v| values.iter().any(|candidate| candidate == v))
        .retag("OneOf")
        .with_label(label)
}

/// Always succeeds.
pub fn pass() -> Schema {
    condition(|_| true).retag("Pass")
}

/// Always fails.
pub fn fail() -> Schema {
    condition(|_| false).retag("Fail")
}

/// Always succeeds; reads as "any value is acceptable here" in a larger
/// schema, which `pass` does not.
pub fn dont_care() -> Schema {
    condition(|_| true).retag("DontCare").with_label("any value")
}

// ------------------------------- Tests ------------------------------------ //

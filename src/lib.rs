//! Composable schema validation for JSON-like values.
//!
//! Build schemas out of small leaf validators (type checks, numeric
//! comparisons, pattern tests, constants) and compose them with combinators
//! (`and`/`or`/`if_else`, arrays, tuples, records) to describe arbitrarily
//! complex data shapes, with no separate schema language. Checking a value
//! yields a pass/fail verdict plus a diagnostic trace of every sub-check
//! taken, renderable as indented text for logs and test failures.
//!
//! Schemas are immutable once built and cheap to clone; one schema can be
//! shared across threads and reused for any number of evaluations.
//!
//! ```
//! use json_shape::{validate, Value};
//! use json_shape::{and, greater_than_equal, integer, record_with, string};
//!
//! let person = record_with(
//!     [("name", string())],
//!     [("age", and(integer(), greater_than_equal(0)))],
//! )
//! .unwrap();
//!
//! let ok = Value::from(serde_json::json!({"name": "ada", "age": 36}));
//! let bad = Value::from(serde_json::json!({"name": "ada", "age": -1}));
//! assert!(validate(&ok, &person));
//! assert!(!validate(&bad, &person));
//! ```

pub mod combinators;
pub mod containers;
pub mod primitives;
pub mod schema;
pub mod trace;
pub mod value;

pub use combinators::{and, any, every, if_else, or};
pub use containers::{
    ObjectSpec, array, array_sized, hash_table, nullable, object, record, record_with, tuple,
};
pub use primitives::{
    boolean, condition, constant, dont_care, fail, greater_than, greater_than_equal, integer,
    less_than, less_than_equal, number, of_type, one_of, pass, pattern, pattern_regex, string,
};
pub use schema::{Match, Schema, SchemaError};
pub use trace::{Step, Trace, format_trace, format_trace_color};
pub use value::{Value, ValueType};

use std::fmt;

// ------------------------------- Facade ----------------------------------- //

/// True iff `schema` accepts `value`. Shorthand for `schema.test(value).matched`.
pub fn validate(value: &Value, schema: &Schema) -> bool {
    schema.test(value).matched
}

/// A single failure reason for callers that don't want the full trace tree.
#[derive(Debug, Clone)]
pub struct Violation {
    pub value: Value,
    pub schema: Schema,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// `None` when the value conforms; otherwise one [`Violation`] describing
/// the first failing path found under the short-circuit rules.
pub fn violates_schema(value: &Value, schema: &Schema) -> Option<Violation> {
    let outcome = schema.test(value);
    if outcome.matched {
        None
    } else {
        Some(Violation {
            value: value.clone(),
            schema: schema.clone(),
            message: trace::failure_message(&outcome.trace),
        })
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use super::*;

    fn sample_values() -> Vec<Value> {
        vec![
            Value::Null,
            Value::Bool(false),
            Value::Number(0.0),
            Value::Number(f64::NAN),
            Value::String(String::new()),
            Value::from(serde_json::json!([1, [2], {"x": null}])),
            Value::from(serde_json::json!({"deep": {"deeper": []}})),
        ]
    }

    #[test]
    fn pass_accepts_and_fail_rejects_everything() {
        for value in sample_values() {
            assert!(validate(&value, &pass()), "pass rejected {value}");
            assert!(!validate(&value, &fail()), "fail accepted {value}");
        }
    }

    #[test]
    fn nullable_property_holds_for_all_samples() {
        let inner = integer();
        let schema = nullable(inner.clone());
        for value in sample_values() {
            let expected = value == Value::Null || validate(&value, &inner);
            assert_eq!(validate(&value, &schema), expected, "on {value}");
        }
    }

    #[test]
    fn violates_schema_reports_one_reason() {
        let schema = record([("port", and(integer(), greater_than(0)))]);
        let ok = Value::from(serde_json::json!({"port": 8080}));
        assert!(violates_schema(&ok, &schema).is_none());

        let bad = Value::from(serde_json::json!({"port": -1}));
        let violation = violates_schema(&bad, &schema).expect("must violate");
        assert_eq!(violation.value, bad);
        assert!(Schema::ptr_eq(&violation.schema, &schema));
        assert!(!violation.message.is_empty());
        assert_eq!(violation.to_string(), violation.message);
    }

    #[test]
    fn match_exposes_verdict_and_trace() {
        let schema = tuple(vec![number(), string()]);
        let outcome = schema.test(&Value::from(serde_json::json!([1, 2])));
        assert!(!outcome.matched);
        assert_eq!(outcome.trace.len(), 1, "one root step");
        let rendered = format_trace(&outcome.trace);
        assert!(rendered.lines().next().unwrap_or("").starts_with("fail Tuple"));
    }

    // Shared once, evaluated from many threads: evaluation writes only to
    // its own trace, never to the schema.
    static EVENT: Lazy<Schema> = Lazy::new(|| {
        record_with(
            [
                ("kind", one_of(["start", "stop"])),
                ("at", and(integer(), greater_than_equal(0))),
            ],
            [("note", string())],
        )
        .expect("static schema is well-formed")
    });

    #[test]
    fn one_schema_serves_concurrent_evaluations() {
        std::thread::scope(|scope| {
            for worker in 0..4 {
                scope.spawn(move || {
                    for i in 0..100 {
                        let ok = Value::from(serde_json::json!({
                            "kind": "start",
                            "at": worker * 1000 + i,
                        }));
                        assert!(validate(&ok, &EVENT));
                        let bad = Value::from(serde_json::json!({"kind": "pause", "at": i}));
                        assert!(!validate(&bad, &EVENT));
                    }
                });
            }
        });
    }
}

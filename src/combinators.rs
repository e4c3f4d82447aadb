//! Structural composition: conjunction, disjunction, and the conditional
//! built from them.

use crate::schema::{Kind, Schema};

/// Short-circuiting and: schemas run left to right, the first failure ends
/// the run. An empty list vacuously passes.
pub fn every(schemas: Vec<Schema>) -> Schema {
    Schema::new("Every", Kind::Every(schemas))
}

/// Two-argument [`every`].
pub fn and(a: Schema, b: Schema) -> Schema {
    every(vec![a, b]).retag("And")
}

/// Short-circuiting or with backtracking: alternatives run left to right
/// against the same value, the first success ends the run. An empty list
/// always fails.
pub fn any(schemas: Vec<Schema>) -> Schema {
    Schema::new("Any", Kind::Any(schemas))
}

/// Two-argument [`any`].
pub fn or(a: Schema, b: Schema) -> Schema {
    any(vec![a, b]).retag("Or")
}

/// `or(and(condition, then), otherwise)`: when `condition` holds the value
/// must also satisfy `then`; otherwise it falls through to `otherwise`,
/// without re-testing `condition` there.
pub fn if_else(condition: Schema, then: Schema, otherwise: Schema) -> Schema {
    or(and(condition, then), otherwise).retag("If")
}

// ------------------------------- Tests ------------------------------------ //

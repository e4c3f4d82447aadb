//! The schema core: a closed set of validator variants plus the evaluation
//! engine.
//!
//! A [`Schema`] is an immutable rule over [`Value`]s. The runtime
//! representation is deliberately small: `Condition`, `Every`, `Any`,
//! `Array`, `Tuple`, and `Object`. Every other constructor in the crate
//! (`and`, `or`, `if_else`, `record`, `nullable`, the typed primitives, ...)
//! is sugar over these plus plain predicate functions and introduces no new
//! variant.
//!
//! Evaluation is plain recursion: `eval(value, trace) -> bool`, where each
//! node appends exactly one [`Step`] for itself (carrying the inner trace of
//! whatever sub-checks it ran) before returning. Disjunction backtracks by
//! looping to the next alternative on failure; conjunction short-circuits on
//! the first failure. No state outside the per-call trace is ever written,
//! so one schema can serve any number of concurrent evaluations.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::primitives::{condition, of_type};
use crate::trace::{Step, Trace};
use crate::value::{Value, ValueType};

// ------------------------------- Types ------------------------------------ //

pub(crate) type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A validation rule. Cheap to clone (shared, immutable node) and safe to
/// reuse across threads.
#[derive(Clone)]
pub struct Schema {
    node: Arc<Node>,
}

#[derive(Clone)]
struct Node {
    tag: &'static str,
    label: Label,
    doc: Option<String>,
    kind: Kind,
}

/// A label is either absent, fixed at build time, or read through another
/// schema at access time (`nullable` borrows the wrapped schema's label
/// unless explicitly overridden).
#[derive(Clone)]
enum Label {
    None,
    Fixed(String),
    Derived(Schema),
}

/// The gate/arity/probe schemas inside `Array`/`Tuple`/`Object` are built
/// once at construction and reused by every run, so repeated runs of one
/// schema produce traces made of the same nodes (trace equality compares
/// schema identity).
#[derive(Clone)]
pub(crate) enum Kind {
    Condition(Predicate),
    Every(Vec<Schema>),
    Any(Vec<Schema>),
    Array { gate: Schema, item: Schema, length: Schema },
    Tuple { gate: Schema, arity: Schema, items: Vec<Schema> },
    Object(ObjectPlan),
}

/// Internal spec of an `Object` schema. Built through
/// [`ObjectSpec`](crate::containers::ObjectSpec), which rejects a name
/// declared both required and optional at construction time, then sealed
/// into an [`ObjectPlan`].
#[derive(Clone)]
pub(crate) struct ObjectShape {
    pub(crate) required: IndexMap<String, Schema>,
    pub(crate) optional: IndexMap<String, Schema>,
    pub(crate) without: Vec<String>,
    pub(crate) allow_other_properties: bool,
}

impl Default for ObjectShape {
    fn default() -> Self {
        ObjectShape {
            required: IndexMap::new(),
            optional: IndexMap::new(),
            without: Vec::new(),
            allow_other_properties: true,
        }
    }
}

/// Evaluation-ready form of an [`ObjectShape`]: the type gate and the
/// per-property presence/absence/extras probes, constructed once.
#[derive(Clone)]
pub(crate) struct ObjectPlan {
    gate: Schema,
    /// name, presence probe, property schema
    required: Vec<(String, Schema, Schema)>,
    optional: Vec<(String, Schema)>,
    /// name, absence probe
    without: Vec<(String, Schema)>,
    /// present iff the shape is closed
    extras: Option<Schema>,
}

impl ObjectShape {
    pub(crate) fn plan(self) -> ObjectPlan {
        let extras = (!self.allow_other_properties).then(|| extras_probe(&self));
        let required = self
            .required
            .iter()
            .map(|(name, schema)| (name.clone(), presence_probe(name.clone()), schema.clone()))
            .collect();
        let optional = self.optional.into_iter().collect();
        let without = self
            .without
            .iter()
            .map(|name| (name.clone(), absence_probe(name.clone())))
            .collect();
        ObjectPlan {
            gate: of_type(ValueType::Object),
            required,
            optional,
            without,
            extras,
        }
    }
}

/// Result of a top-level [`Schema::test`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub matched: bool,
    pub trace: Trace,
}

/// Construction-time misuse. These are programmer errors surfaced when the
/// schema is built; a value failing a well-formed schema is never an error.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("property {name:?} is declared both required and optional")]
    RequiredAndOptional { name: String },
    #[error("invalid pattern: {0}")]
    BadPattern(#[from] regex::Error),
}

// ---------------------------- Construction -------------------------------- //

impl Schema {
    pub(crate) fn new(tag: &'static str, kind: Kind) -> Self {
        Schema {
            node: Arc::new(Node {
                tag,
                label: Label::None,
                doc: None,
                kind,
            }),
        }
    }

    /// Return a copy of this schema with the label set. Schemas stay
    /// immutable: labeling builds a new value, the original is untouched.
    pub fn with_label(self, label: impl Into<String>) -> Self {
        let mut node = (*self.node).clone();
        node.label = Label::Fixed(label.into());
        Schema { node: Arc::new(node) }
    }

    /// Return a copy with documentation attached. Docs never influence
    /// evaluation; they ride along for tooling.
    pub fn with_doc(self, doc: impl Into<String>) -> Self {
        let mut node = (*self.node).clone();
        node.doc = Some(doc.into());
        Schema { node: Arc::new(node) }
    }

    pub(crate) fn with_derived_label(self, source: Schema) -> Self {
        let mut node = (*self.node).clone();
        node.label = Label::Derived(source);
        Schema { node: Arc::new(node) }
    }

    pub(crate) fn retag(self, tag: &'static str) -> Self {
        let mut node = (*self.node).clone();
        node.tag = tag;
        Schema { node: Arc::new(node) }
    }

    // ------------------------------ Metadata ------------------------------ //

    /// The constructor tag (`"Condition"`, `"Every"`, `"Record"`, ...),
    /// used only by trace rendering.
    pub fn tag(&self) -> &'static str {
        self.node.tag
    }

    pub fn label(&self) -> Option<String> {
        match &self.node.label {
            Label::None => None,
            Label::Fixed(label) => Some(label.clone()),
            Label::Derived(source) => source.label(),
        }
    }

    pub fn doc(&self) -> Option<&str> {
        self.node.doc.as_deref()
    }

    /// Identity comparison: true iff both handles share the same node.
    pub fn ptr_eq(a: &Schema, b: &Schema) -> bool {
        Arc::ptr_eq(&a.node, &b.node)
    }

    // ----------------------------- Evaluation ----------------------------- //

    /// Check `value` against this schema. Never panics for well-formed
    /// schemas; a mismatch is a normal outcome, not an error.
    pub fn test(&self, value: &Value) -> Match {
        let mut trace = Trace::new();
        let matched = self.eval(value, &mut trace);
        Match { matched, trace }
    }

    /// Appends exactly one step (this node, the value, the outcome, and the
    /// inner trace of sub-checks) and reports the outcome.
    pub(crate) fn eval(&self, value: &Value, out: &mut Trace) -> bool {
        let (matched, inner) = match &self.node.kind {
            Kind::Condition(predicate) => (predicate(value), Trace::new()),
            Kind::Every(schemas) => eval_every(schemas, value),
            Kind::Any(schemas) => eval_any(schemas, value),
            Kind::Array { gate, item, length } => eval_array(gate, item, length, value),
            Kind::Tuple { gate, arity, items } => eval_tuple(gate, arity, items, value),
            Kind::Object(plan) => eval_object(plan, value),
        };
        out.push(Step {
            schema: self.clone(),
            value: value.clone(),
            matched,
            inner,
        });
        matched
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Schema");
        out.field("tag", &self.node.tag);
        if let Some(label) = self.label() {
            out.field("label", &label);
        }
        out.finish_non_exhaustive()
    }
}

// ------------------------- Variant evaluation ----------------------------- //

/// Conjunction: left to right, stop at the first failure.
fn eval_every(schemas: &[Schema], value: &Value) -> (bool, Trace) {
    let mut inner = Trace::new();
    for schema in schemas {
        if !schema.eval(value, &mut inner) {
            return (false, inner);
        }
    }
    (true, inner)
}

/// Disjunction with backtracking: left to right, stop at the first success.
/// The inner trace keeps every attempted branch, so a failed `any` shows all
/// the alternatives that were tried.
fn eval_any(schemas: &[Schema], value: &Value) -> (bool, Trace) {
    let mut inner = Trace::new();
    for schema in schemas {
        if schema.eval(value, &mut inner) {
            return (true, inner);
        }
    }
    // Zero alternatives can never succeed.
    (false, inner)
}

/// Array: type gate, then the length schema against the length, then items
/// in index order. The item schema is never invoked for an empty array or
/// past a failed length check.
fn eval_array(gate: &Schema, item: &Schema, length: &Schema, value: &Value) -> (bool, Trace) {
    let mut inner = Trace::new();
    let Value::Array(elements) = value else {
        gate.eval(value, &mut inner);
        return (false, inner);
    };
    gate.eval(value, &mut inner);
    let length_value = Value::Number(elements.len() as f64);
    if !length.eval(&length_value, &mut inner) {
        return (false, inner);
    }
    for element in elements {
        if !item.eval(element, &mut inner) {
            return (false, inner);
        }
    }
    (true, inner)
}

/// Tuple: type gate, exact arity as its own distinct step, then element-wise
/// checks in order with short-circuit.
fn eval_tuple(gate: &Schema, arity: &Schema, items: &[Schema], value: &Value) -> (bool, Trace) {
    let mut inner = Trace::new();
    let Value::Array(elements) = value else {
        gate.eval(value, &mut inner);
        return (false, inner);
    };
    gate.eval(value, &mut inner);
    if !arity.eval(value, &mut inner) {
        return (false, inner);
    }
    for (schema, element) in items.iter().zip(elements) {
        if !schema.eval(element, &mut inner) {
            return (false, inner);
        }
    }
    (true, inner)
}

/// Object: type gate (arrays and null are not objects), required properties
/// (present and valid), optional properties (valid when present), forbidden
/// properties absent, and, for closed shapes, no keys outside
/// required ∪ optional. Property order follows declaration order, which the
/// plan keeps deterministic.
fn eval_object(plan: &ObjectPlan, value: &Value) -> (bool, Trace) {
    let mut inner = Trace::new();
    let Value::Object(map) = value else {
        plan.gate.eval(value, &mut inner);
        return (false, inner);
    };
    plan.gate.eval(value, &mut inner);

    for (name, presence, schema) in &plan.required {
        match map.get(name) {
            None => {
                presence.eval(value, &mut inner);
                return (false, inner);
            }
            Some(property) => {
                if !schema.eval(property, &mut inner) {
                    return (false, inner);
                }
            }
        }
    }

    for (name, schema) in &plan.optional {
        if let Some(property) = map.get(name) {
            if !schema.eval(property, &mut inner) {
                return (false, inner);
            }
        }
    }

    for (name, absence) in &plan.without {
        if map.contains_key(name) {
            absence.eval(value, &mut inner);
            return (false, inner);
        }
    }

    if let Some(probe) = &plan.extras {
        if !probe.eval(value, &mut inner) {
            return (false, inner);
        }
    }

    (true, inner)
}

fn presence_probe(name: String) -> Schema {
    let label = format!("has required property {name:?}");
    condition(move |v| v.get(&name).is_some()).with_label(label)
}

fn absence_probe(name: String) -> Schema {
    let label = format!("does not have property {name:?}");
    condition(move |v| v.get(&name).is_none()).with_label(label)
}

fn extras_probe(shape: &ObjectShape) -> Schema {
    let allowed: Vec<String> = shape
        .required
        .keys()
        .chain(shape.optional.keys())
        .cloned()
        .collect();
    condition(move |v| match v {
        Value::Object(map) => map.keys().all(|key| allowed.contains(key)),
        _ => false,
    })
    .with_label("no properties beyond the declared ones")
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::condition;

    #[test]
    fn condition_pass_and_fail() {
        assert!(condition(|_| true).test(&Value::Null).matched);
        assert!(!condition(|_| false).test(&Value::Null).matched);
        let positive = condition(|v| matches!(v, Value::Number(n) if *n > 0.0));
        assert!(positive.test(&Value::Number(1.0)).matched);
        assert!(!positive.test(&Value::Number(-1.0)).matched);
        assert!(!positive.test(&Value::String("1".into())).matched);
    }

    #[test]
    fn labels_and_docs_ride_along() {
        let schema = condition(|_| true)
            .with_label("a trivial schema")
            .with_doc("a trivial docstring");
        assert_eq!(schema.label().as_deref(), Some("a trivial schema"));
        assert_eq!(schema.doc(), Some("a trivial docstring"));
        assert_eq!(schema.tag(), "Condition");
    }

    #[test]
    fn labeling_does_not_mutate_the_original() {
        let bare = condition(|_| true);
        let labeled = bare.clone().with_label("named");
        assert_eq!(bare.label(), None);
        assert_eq!(labeled.label().as_deref(), Some("named"));
    }

    #[test]
    fn trace_carries_the_schema_node() {
        let schema = condition(|_| true);
        let outcome = schema.test(&Value::Null);
        assert_eq!(outcome.trace.len(), 1, "one step for one leaf");
        let step = &outcome.trace.steps()[0];
        assert!(Schema::ptr_eq(&step.schema, &schema));
        assert!(step.matched);
        assert!(step.inner.is_empty(), "leaf steps have no inner trace");
    }

    #[test]
    fn evaluation_is_idempotent() {
        let schema = crate::containers::record([(
            "n",
            crate::combinators::and(crate::primitives::number(), condition(|_| true)),
        )]);
        let value = Value::from(serde_json::json!({"n": 1}));
        let first = schema.test(&value);
        let second = schema.test(&value);
        assert_eq!(first.matched, second.matched);
        assert_eq!(first.trace, second.trace, "no hidden state between runs");
    }

    #[test]
    fn repeated_runs_yield_identical_traces() {
        use crate::containers::{array, object, record, tuple};
        use crate::primitives::{number, string};

        // One case per container path that uses built-in gate/arity/probe
        // nodes: those are constructed once per schema, so two runs must
        // produce traces made of the very same nodes.
        let forbidding = object()
            .required("a", number())
            .without("legacy")
            .build()
            .expect("well-formed");
        let cases: Vec<(Schema, Value)> = vec![
            (array(number()), Value::from(serde_json::json!([1, 2]))),
            (array(number()), Value::from(serde_json::json!("not an array"))),
            (tuple(vec![number(), string()]), Value::from(serde_json::json!([1]))),
            (tuple(vec![number(), string()]), Value::from(serde_json::json!([1, "x"]))),
            (record([("a", number())]), Value::from(serde_json::json!({}))),
            (record([("a", number())]), Value::from(serde_json::json!({"a": 1, "b": 2}))),
            (record([("a", number())]), Value::from(serde_json::json!({"a": 1}))),
            (forbidding, Value::from(serde_json::json!({"a": 1, "legacy": true}))),
        ];
        for (schema, value) in cases {
            let first = schema.test(&value);
            let second = schema.test(&value);
            assert_eq!(first.matched, second.matched);
            assert_eq!(
                first.trace, second.trace,
                "traces diverged for {} on {value}",
                schema.tag()
            );
        }
    }

    #[test]
    fn schemas_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
        assert_send_sync::<Match>();
    }
}

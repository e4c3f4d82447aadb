//! Container schemas: homogeneous arrays, fixed tuples, keyed objects, and
//! the null-or wrapper.

use indexmap::IndexMap;

use crate::combinators::or;
use crate::primitives::{condition, constant, of_type, pass};
use crate::schema::{Kind, ObjectShape, Schema, SchemaError};
use crate::value::{Value, ValueType};

// ------------------------------- Arrays ----------------------------------- //

/// A sequence whose every element satisfies `item`. Elements are checked in
/// index order, stopping at the first failure; an empty array passes without
/// the item schema ever running.
pub fn array(item: Schema) -> Schema {
    array_sized(item, pass())
}

/// [`array`] with a length constraint: `length` is checked against the
/// element count (as a number) before any element runs.
pub fn array_sized(item: Schema, length: Schema) -> Schema {
    Schema::new(
        "Array",
        Kind::Array {
            gate: of_type(ValueType::Array),
            item,
            length,
        },
    )
}

/// A fixed heterogeneous sequence: exactly `items.len()` elements, element
/// `i` satisfying `items[i]`. A length mismatch is its own distinct failure,
/// not an item failure.
pub fn tuple(items: Vec<Schema>) -> Schema {
    let want = items.len();
    let arity = condition(move |v| matches!(v, Value::Array(xs) if xs.len() == want))
        .with_label(format!("exactly {want} elements"));
    Schema::new(
        "Tuple",
        Kind::Tuple {
            gate: of_type(ValueType::Array),
            arity,
            items,
        },
    )
}

// ------------------------------- Objects ---------------------------------- //

/// Builder for object schemas. Collects required/optional/forbidden
/// properties and the extra-property policy, then validates the spec once at
/// [`build`](ObjectSpec::build).
#[derive(Default)]
pub struct ObjectSpec {
    shape: ObjectShape,
}

impl ObjectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// The property must be present and satisfy `schema`.
    pub fn required(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.shape.required.insert(name.into(), schema);
        self
    }

    /// The property must satisfy `schema` when present; absence is fine.
    pub fn optional(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.shape.optional.insert(name.into(), schema);
        self
    }

    /// The property must NOT be present.
    pub fn without(mut self, name: impl Into<String>) -> Self {
        self.shape.without.push(name.into());
        self
    }

    /// Whether keys outside required ∪ optional are tolerated. Defaults to
    /// true (open shape).
    pub fn allow_other_properties(mut self, allow: bool) -> Self {
        self.shape.allow_other_properties = allow;
        self
    }

    /// Validate the spec and build the schema. Declaring a name both
    /// required and optional is a programmer error and fails here, not at
    /// validation time.
    pub fn build(self) -> Result<Schema, SchemaError> {
        for name in self.shape.optional.keys() {
            if self.shape.required.contains_key(name) {
                return Err(SchemaError::RequiredAndOptional { name: name.clone() });
            }
        }
        Ok(Schema::new("Object", Kind::Object(self.shape.plan())))
    }
}

/// Start an object schema: `object().required("id", string()).build()?`.
pub fn object() -> ObjectSpec {
    ObjectSpec::new()
}

/// The common closed-struct case: every listed property required, nothing
/// else allowed. Infallible since a single map cannot double-declare.
pub fn record<I, S>(required: I) -> Schema
where
    I: IntoIterator<Item = (S, Schema)>,
    S: Into<String>,
{
    let mut map = IndexMap::new();
    for (name, schema) in required {
        map.insert(name.into(), schema);
    }
    Schema::new(
        "Record",
        Kind::Object(
            ObjectShape {
                required: map,
                allow_other_properties: false,
                ..ObjectShape::default()
            }
            .plan(),
        ),
    )
}

/// Closed struct with optional properties. Fails at construction when a
/// name appears in both maps.
pub fn record_with<I, J, S, T>(required: I, optional: J) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = (S, Schema)>,
    J: IntoIterator<Item = (T, Schema)>,
    S: Into<String>,
    T: Into<String>,
{
    let mut spec = object().allow_other_properties(false);
    for (name, schema) in required {
        spec = spec.required(name, schema);
    }
    for (name, schema) in optional {
        spec = spec.optional(name, schema);
    }
    spec.build().map(|schema| schema.retag("Record"))
}

/// The common open-map case: any object passes, whatever its keys.
pub fn hash_table() -> Schema {
    Schema::new("HashTable", Kind::Object(ObjectShape::default().plan()))
}

// ------------------------------ Nullable ---------------------------------- //

/// Exactly null, or a value satisfying `schema`. Unless overridden with
/// [`Schema::with_label`], its label reads through to the wrapped schema's
/// label at access time.
pub fn nullable(schema: Schema) -> Schema {
    let source = schema.clone();
    or(constant(Value::Null), schema)
        .retag("Nullable")
        .with_derived_label(source)
}

// ------------------------------- Tests ------------------------------------ //

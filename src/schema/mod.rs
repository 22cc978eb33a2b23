mod builder;
mod registry;

pub use builder::SchemaBuilder;
pub use registry::{
    BASE_FIELDS, FieldSpec, ROCK_TYPE_FIELD, RockSchema, RockVariantTag, SCHEMA_NAME, fields_for,
    resolve_schema, resolve_schema_by_name,
};

use serde_json::Value;

/// Schema is a representation of a JSON Schema that describes the structure
/// the model should return.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub schema: Value,
}

impl Schema {
    pub fn new(schema: Value) -> Self {
        Self { schema }
    }

    pub fn to_json(&self) -> &Value {
        &self.schema
    }

    /// Names listed under `required`, in order.
    pub fn required_fields(&self) -> Vec<&str> {
        self.schema["required"]
            .as_array()
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Create a schema builder for an object type
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::object()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.schema)
    }
}

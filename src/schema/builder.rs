use serde_json::{Map, Value, json};

use super::Schema;

/// SchemaBuilder helps construct JSON Schema incrementally.
///
/// Properties and the `required` list keep the order they were added in, so the
/// schema sent to the model lists fields in display order.
#[derive(Default)]
pub struct SchemaBuilder {
    schema_type: String,
    title: Option<String>,
    description: Option<String>,
    properties: Vec<(String, Value)>,
    required: Vec<String>,
    additional_properties: Option<bool>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            ..Default::default()
        }
    }

    pub fn object() -> Self {
        Self::new()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a property. Adding a name twice replaces the earlier schema in place.
    pub fn property(
        mut self,
        name: impl Into<String>,
        property_schema: Value,
        required: bool,
    ) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = property_schema,
            None => self.properties.push((name.clone(), property_schema)),
        }
        if required && !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Add a required free-text property.
    pub fn string_property(self, name: impl Into<String>, description: &str) -> Self {
        self.property(
            name,
            json!({
                "type": "string",
                "description": description
            }),
            true,
        )
    }

    /// Add a required string property restricted to a single literal value.
    pub fn literal_property(
        self,
        name: impl Into<String>,
        literal: &str,
        description: &str,
    ) -> Self {
        self.property(
            name,
            json!({
                "type": "string",
                "enum": [literal],
                "description": description
            }),
            true,
        )
    }

    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = Some(allowed);
        self
    }

    pub fn build(self) -> Schema {
        let mut schema = json!({
            "type": self.schema_type
        });

        if let Some(title) = self.title {
            schema["title"] = json!(title);
        }

        if let Some(description) = self.description {
            schema["description"] = json!(description);
        }

        if !self.properties.is_empty() {
            let properties: Map<String, Value> = self.properties.into_iter().collect();
            schema["properties"] = Value::Object(properties);

            if !self.required.is_empty() {
                schema["required"] = json!(self.required);
            }
        }

        if let Some(allowed) = self.additional_properties {
            schema["additionalProperties"] = json!(allowed);
        }

        Schema::new(schema)
    }
}

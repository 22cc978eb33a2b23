use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::schema::{FieldSpec, ROCK_TYPE_FIELD, RockVariantTag, fields_for};

/// One rock's analyzed or manually entered properties.
///
/// A record holds a value for every field of its tag's schema plus the
/// `rockType` discriminator. Records are produced whole by the extraction
/// client or the manual-entry adapter and are never updated in place.
///
/// Serializing a record yields a flat JSON object: the fields in display
/// order followed by `rockType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RockRecord {
    tag: RockVariantTag,
    rock_type: String,
    values: BTreeMap<String, String>,
}

impl RockRecord {
    pub(crate) fn new(
        tag: RockVariantTag,
        rock_type: impl Into<String>,
        values: BTreeMap<String, String>,
    ) -> Self {
        Self {
            tag,
            rock_type: rock_type.into(),
            values,
        }
    }

    /// The tag whose schema governs this record.
    pub fn tag(&self) -> RockVariantTag {
        self.tag
    }

    /// The `rockType` discriminator. Equal to the tag name except for `other`,
    /// where the model or user may name the rock freely.
    pub fn rock_type(&self) -> &str {
        &self.rock_type
    }

    /// Value of a schema field. `rockType` is also accepted.
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == ROCK_TYPE_FIELD {
            return Some(&self.rock_type);
        }
        self.values.get(name).map(String::as_str)
    }

    /// Field values without the discriminator.
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Every key of the record: schema fields in display order, then `rockType`.
    pub fn keys(&self) -> Vec<&str> {
        self.ordered_fields()
            .into_iter()
            .map(|(spec, _)| spec.name)
            .chain(std::iter::once(ROCK_TYPE_FIELD))
            .collect()
    }

    /// Schema fields paired with their values, in display order.
    pub fn ordered_fields(&self) -> Vec<(FieldSpec, &str)> {
        fields_for(self.tag)
            .into_iter()
            .map(|spec| {
                let value = self.values.get(spec.name).map(String::as_str).unwrap_or("");
                (spec, value)
            })
            .collect()
    }

    /// The record as a JSON object.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (spec, value) in self.ordered_fields() {
            object.insert(spec.name.to_string(), Value::String(value.to_string()));
        }
        object.insert(
            ROCK_TYPE_FIELD.to_string(),
            Value::String(self.rock_type.clone()),
        );
        Value::Object(object)
    }
}

impl Serialize for RockRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.ordered_fields();
        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        for (spec, value) in fields {
            map.serialize_entry(spec.name, value)?;
        }
        map.serialize_entry(ROCK_TYPE_FIELD, &self.rock_type)?;
        map.end()
    }
}

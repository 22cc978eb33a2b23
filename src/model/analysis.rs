use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::{debug, error, trace};

use crate::error::{Result, RockError};
use crate::model::RockRecord;
use crate::schema::{ROCK_TYPE_FIELD, RockSchema, RockVariantTag, resolve_schema};

/// Properties every rock analysis reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseProperties {
    pub composition: String,
    pub color: String,
    pub texture: String,
    pub hardness: String,
    pub density: String,
    pub formation: String,
    pub other_properties: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraniteAnalysis {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub rock_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimestoneAnalysis {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub fossil_content: String,
    pub rock_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShaleAnalysis {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub lamination: String,
    pub bedding_planes: String,
    pub fossil_content: String,
    pub rock_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlateAnalysis {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub cleavage: String,
    pub rock_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandstoneAnalysis {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub cementation: String,
    pub bedding_layering: String,
    pub rock_type: String,
}

/// Analysis of a rock outside the named variants; `rockType` is free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherAnalysis {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub rock_type: String,
}

/// A typed model response for one rock variant.
///
/// Implementors are plain serde structs whose camelCase field names match the
/// variant's schema. `validate` is run after deserialization; the default
/// checks the discriminator against the variant's tag.
pub trait RockAnalysis: Serialize + DeserializeOwned + Send + 'static {
    /// The variant this type decodes.
    const TAG: RockVariantTag;

    fn rock_type(&self) -> &str;

    fn validate(&self) -> Result<()> {
        if Self::TAG.has_literal_rock_type() && self.rock_type() != Self::TAG.as_str() {
            return Err(RockError::Extraction(format!(
                "Response rockType '{}' does not match requested rock type '{}'",
                self.rock_type(),
                Self::TAG
            )));
        }
        Ok(())
    }

    /// Flatten the typed value into a record.
    fn into_record(self) -> Result<RockRecord> {
        let Value::Object(mut object) = serde_json::to_value(&self)? else {
            return Err(RockError::Extraction(
                "Typed analysis did not serialize to an object".to_string(),
            ));
        };
        let rock_type = match object.remove(ROCK_TYPE_FIELD) {
            Some(Value::String(rock_type)) => rock_type,
            _ => self.rock_type().to_string(),
        };
        let values: BTreeMap<String, String> = object
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::String(s) => Some((name, s)),
                _ => None,
            })
            .collect();
        Ok(RockRecord::new(Self::TAG, rock_type, values))
    }
}

macro_rules! impl_rock_analysis {
    ($($ty:ty => $tag:expr),* $(,)?) => {
        $(
            impl RockAnalysis for $ty {
                const TAG: RockVariantTag = $tag;

                fn rock_type(&self) -> &str {
                    &self.rock_type
                }
            }
        )*
    };
}

impl_rock_analysis! {
    GraniteAnalysis => RockVariantTag::Granite,
    LimestoneAnalysis => RockVariantTag::Limestone,
    ShaleAnalysis => RockVariantTag::Shale,
    SlateAnalysis => RockVariantTag::Slate,
    SandstoneAnalysis => RockVariantTag::Sandstone,
    OtherAnalysis => RockVariantTag::Other,
}

/// Decodes a model response into a record for one tag.
pub trait RecordDecoder: Send + Sync {
    fn tag(&self) -> RockVariantTag;

    fn decode(&self, value: Value) -> Result<RockRecord>;
}

/// [`RecordDecoder`] backed by a typed [`RockAnalysis`] struct.
pub struct TypedDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedDecoder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RockAnalysis> RecordDecoder for TypedDecoder<T> {
    fn tag(&self) -> RockVariantTag {
        T::TAG
    }

    fn decode(&self, value: Value) -> Result<RockRecord> {
        let tag = T::TAG;
        check_conformance(&resolve_schema(tag), &value)?;

        let typed: T = serde_json::from_value(value).map_err(|e| {
            error!(error = %e, tag = %tag, "Typed decode failed");
            RockError::Extraction(format!("Response does not match the {} schema: {}", tag, e))
        })?;
        typed.validate()?;

        debug!(tag = %tag, "Decoded typed rock analysis");
        typed.into_record()
    }
}

/// Pick the decoder for a tag.
pub fn decoder_for(tag: RockVariantTag) -> Box<dyn RecordDecoder> {
    match tag {
        RockVariantTag::Granite => Box::new(TypedDecoder::<GraniteAnalysis>::new()),
        RockVariantTag::Limestone => Box::new(TypedDecoder::<LimestoneAnalysis>::new()),
        RockVariantTag::Shale => Box::new(TypedDecoder::<ShaleAnalysis>::new()),
        RockVariantTag::Slate => Box::new(TypedDecoder::<SlateAnalysis>::new()),
        RockVariantTag::Sandstone => Box::new(TypedDecoder::<SandstoneAnalysis>::new()),
        RockVariantTag::Other => Box::new(TypedDecoder::<OtherAnalysis>::new()),
    }
}

/// Check that a decoded response has exactly the schema's fields plus
/// `rockType`, all of them strings.
pub fn check_conformance(schema: &RockSchema, value: &Value) -> Result<()> {
    let Some(object) = value.as_object() else {
        error!("Model response is not a JSON object");
        return Err(RockError::Extraction(
            "Response is not a JSON object".to_string(),
        ));
    };

    let expected: Vec<&str> = schema
        .field_names()
        .chain(std::iter::once(ROCK_TYPE_FIELD))
        .collect();

    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|name| !object.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        error!(missing = ?missing, tag = %schema.tag(), "Response is missing required fields");
        return Err(RockError::Extraction(format!(
            "Response is missing required fields: {}",
            missing.join(", ")
        )));
    }

    let unexpected: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|name| !expected.contains(name))
        .collect();
    if !unexpected.is_empty() {
        error!(unexpected = ?unexpected, tag = %schema.tag(), "Response has fields outside the schema");
        return Err(RockError::Extraction(format!(
            "Response contains unexpected fields: {}",
            unexpected.join(", ")
        )));
    }

    if let Some(name) = expected.iter().find(|name| !object[**name].is_string()) {
        return Err(RockError::Extraction(format!(
            "Field '{}' must be a string",
            name
        )));
    }

    trace!(tag = %schema.tag(), "Response conforms to schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn granite_json() -> Value {
        json!({
            "composition": "quartz, feldspar, mica",
            "color": "pink and grey",
            "texture": "phaneritic",
            "hardness": "6-7",
            "density": "2.7 g/cm3",
            "formation": "intrusive igneous",
            "otherProperties": "coarse crystals",
            "rockType": "granite"
        })
    }

    #[test]
    fn test_decoder_for_matches_tag() {
        for tag in RockVariantTag::ALL {
            assert_eq!(decoder_for(tag).tag(), tag);
        }
    }

    #[test]
    fn test_granite_decodes_into_record() {
        let record = decoder_for(RockVariantTag::Granite)
            .decode(granite_json())
            .expect("granite should decode");

        assert_eq!(record.tag(), RockVariantTag::Granite);
        assert_eq!(record.rock_type(), "granite");
        assert_eq!(record.get("otherProperties"), Some("coarse crystals"));
        assert_eq!(record.values().len(), 7);
    }

    #[test]
    fn test_rock_type_mismatch_is_rejected() {
        let mut value = granite_json();
        value["rockType"] = json!("basalt");

        let err = decoder_for(RockVariantTag::Granite)
            .decode(value)
            .unwrap_err();
        assert!(matches!(err, RockError::Extraction(msg) if msg.contains("basalt")));
    }

    #[test]
    fn test_other_accepts_free_rock_type() {
        let mut value = granite_json();
        value["rockType"] = json!("basalt");

        let record = decoder_for(RockVariantTag::Other).decode(value).unwrap();
        assert_eq!(record.tag(), RockVariantTag::Other);
        assert_eq!(record.rock_type(), "basalt");
    }

    #[test]
    fn test_conformance_rejects_extra_fields() {
        let mut value = granite_json();
        value["luster"] = json!("vitreous");

        let err = check_conformance(&resolve_schema(RockVariantTag::Granite), &value).unwrap_err();
        assert_eq!(
            err,
            RockError::Extraction("Response contains unexpected fields: luster".to_string())
        );
    }

    #[test]
    fn test_conformance_rejects_non_string_values() {
        let mut value = granite_json();
        value["hardness"] = json!(6.5);

        let err = check_conformance(&resolve_schema(RockVariantTag::Granite), &value).unwrap_err();
        assert_eq!(
            err,
            RockError::Extraction("Field 'hardness' must be a string".to_string())
        );
    }

    #[test]
    fn test_conformance_rejects_non_object() {
        let err = check_conformance(&resolve_schema(RockVariantTag::Slate), &json!(["a"]))
            .unwrap_err();
        assert!(matches!(err, RockError::Extraction(_)));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{error, trace};

use super::{Schema, SchemaBuilder};
use crate::error::{Result, RockError};

/// Name under which the response constraint is registered with the model.
pub const SCHEMA_NAME: &str = "rock_analysis";

/// Name of the discriminator field carried by every record.
pub const ROCK_TYPE_FIELD: &str = "rockType";

/// The closed set of rock types an analysis can be run against.
///
/// The tag picks the schema that governs both the model's response and the
/// manual-entry form.
///
/// ```
/// use rock_analyzer::RockVariantTag;
/// use std::str::FromStr;
///
/// let tag = RockVariantTag::from_str("Shale").unwrap();
/// assert_eq!(tag, RockVariantTag::Shale);
/// assert_eq!(tag.as_str(), "shale");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RockVariantTag {
    Granite,
    Limestone,
    Shale,
    Slate,
    Sandstone,
    #[default]
    Other,
}

impl RockVariantTag {
    /// Every tag, in the order a selector lists them.
    pub const ALL: [RockVariantTag; 6] = [
        RockVariantTag::Granite,
        RockVariantTag::Limestone,
        RockVariantTag::Shale,
        RockVariantTag::Slate,
        RockVariantTag::Sandstone,
        RockVariantTag::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RockVariantTag::Granite => "granite",
            RockVariantTag::Limestone => "limestone",
            RockVariantTag::Shale => "shale",
            RockVariantTag::Slate => "slate",
            RockVariantTag::Sandstone => "sandstone",
            RockVariantTag::Other => "other",
        }
    }

    /// Human-readable name, e.g. "Sandstone".
    pub fn display_name(&self) -> &'static str {
        match self {
            RockVariantTag::Granite => "Granite",
            RockVariantTag::Limestone => "Limestone",
            RockVariantTag::Shale => "Shale",
            RockVariantTag::Slate => "Slate",
            RockVariantTag::Sandstone => "Sandstone",
            RockVariantTag::Other => "Other",
        }
    }

    /// Whether `rockType` is pinned to this tag's name. Only `Other` leaves it free.
    pub fn has_literal_rock_type(&self) -> bool {
        !matches!(self, RockVariantTag::Other)
    }

    /// Fields this variant adds after the base fields.
    fn variant_fields(&self) -> &'static [FieldSpec] {
        match self {
            RockVariantTag::Granite | RockVariantTag::Other => &[],
            RockVariantTag::Limestone => LIMESTONE_FIELDS,
            RockVariantTag::Shale => SHALE_FIELDS,
            RockVariantTag::Slate => SLATE_FIELDS,
            RockVariantTag::Sandstone => SANDSTONE_FIELDS,
        }
    }
}

impl fmt::Display for RockVariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RockVariantTag {
    type Err = RockError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        RockVariantTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                error!(tag = %s, "Unknown rock type requested");
                RockError::Configuration(format!(
                    "Unknown rock type '{}'. Expected one of: granite, limestone, shale, slate, sandstone, other",
                    s
                ))
            })
    }
}

/// One field of a rock schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Identifier used as the JSON key, unique within a schema
    pub name: &'static str,
    /// Label shown next to the input or result
    pub label: &'static str,
    /// Guidance passed to the model in the JSON Schema
    pub description: &'static str,
    pub required: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, description: &'static str) -> Self {
        Self {
            name,
            label,
            description,
            required: true,
        }
    }
}

/// Fields every rock schema starts with.
pub const BASE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "composition",
        "Composition",
        "The mineral composition of the rock",
    ),
    FieldSpec::new("color", "Color", "The color(s) of the rock"),
    FieldSpec::new("texture", "Texture", "The texture of the rock"),
    FieldSpec::new(
        "hardness",
        "Hardness",
        "The hardness of the rock on the Mohs scale",
    ),
    FieldSpec::new("density", "Density", "The density of the rock"),
    FieldSpec::new(
        "formation",
        "Formation",
        "The formation process of the rock",
    ),
    FieldSpec::new(
        "otherProperties",
        "Other Properties",
        "Any other notable properties of the rock",
    ),
];

const LIMESTONE_FIELDS: &[FieldSpec] = &[FieldSpec::new(
    "fossilContent",
    "Fossil Content",
    "Fossil content found in the limestone",
)];

const SHALE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "lamination",
        "Lamination",
        "Lamination characteristics of the shale",
    ),
    FieldSpec::new(
        "beddingPlanes",
        "Bedding Planes",
        "Bedding planes characteristics",
    ),
    FieldSpec::new(
        "fossilContent",
        "Fossil Content",
        "Fossil content found in the shale",
    ),
];

const SLATE_FIELDS: &[FieldSpec] = &[FieldSpec::new(
    "cleavage",
    "Cleavage",
    "Cleavage characteristics of the slate",
)];

const SANDSTONE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "cementation",
        "Cementation",
        "Cementation characteristics of the sandstone",
    ),
    FieldSpec::new(
        "beddingLayering",
        "Bedding/Layering",
        "Bedding/layering characteristics",
    ),
];

/// The resolved schema for one rock type: its tag and ordered fields.
///
/// The `rockType` discriminator is not part of `fields`; it is added by
/// [`RockSchema::json_schema`] and by the record builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RockSchema {
    tag: RockVariantTag,
    fields: Vec<FieldSpec>,
}

impl RockSchema {
    pub fn tag(&self) -> RockVariantTag {
        self.tag
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// The JSON Schema used as the model's response constraint.
    ///
    /// Every property is a required string and no other properties are allowed.
    /// For named variants `rockType` is restricted to the tag's name.
    pub fn json_schema(&self) -> Schema {
        let mut builder = SchemaBuilder::object()
            .title(format!("{} rock analysis", self.tag.display_name()))
            .additional_properties(false);

        for field in &self.fields {
            builder = builder.string_property(field.name, field.description);
        }

        builder = if self.tag.has_literal_rock_type() {
            builder.literal_property(
                ROCK_TYPE_FIELD,
                self.tag.as_str(),
                &format!("{} rock type", self.tag.display_name()),
            )
        } else {
            builder.string_property(ROCK_TYPE_FIELD, "The type of rock")
        };

        builder.build()
    }
}

/// Resolve the schema for a tag. Total over the closed tag set.
pub fn resolve_schema(tag: RockVariantTag) -> RockSchema {
    let fields: Vec<FieldSpec> = BASE_FIELDS
        .iter()
        .chain(tag.variant_fields())
        .copied()
        .collect();
    trace!(tag = %tag, field_count = fields.len(), "Resolved rock schema");
    RockSchema { tag, fields }
}

/// Resolve a schema from a tag name, failing with a configuration error for
/// names outside the closed set.
pub fn resolve_schema_by_name(name: &str) -> Result<RockSchema> {
    Ok(resolve_schema(name.parse()?))
}

/// Ordered fields for rendering and validation: base fields, then variant fields.
pub fn fields_for(tag: RockVariantTag) -> Vec<FieldSpec> {
    resolve_schema(tag).fields
}

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::model::RockRecord;
use crate::schema::{RockVariantTag, fields_for};

/// Build a record from manually entered values.
///
/// Only the tag's schema fields are read from `values`: a missing field becomes
/// an empty string and names outside the schema are ignored. `rockType` is set
/// to the tag name.
///
/// ```
/// use rock_analyzer::{RockVariantTag, build_record};
/// use std::collections::HashMap;
///
/// let values = HashMap::from([("cleavage".to_string(), "good".to_string())]);
/// let record = build_record(RockVariantTag::Slate, &values);
/// assert_eq!(record.get("cleavage"), Some("good"));
/// assert_eq!(record.get("color"), Some(""));
/// assert_eq!(record.rock_type(), "slate");
/// ```
pub fn build_record(tag: RockVariantTag, values: &HashMap<String, String>) -> RockRecord {
    let fields: BTreeMap<String, String> = fields_for(tag)
        .into_iter()
        .map(|spec| {
            let value = values.get(spec.name).cloned().unwrap_or_default();
            (spec.name.to_string(), value)
        })
        .collect();

    debug!(
        tag = %tag,
        supplied = values.len(),
        filled = fields.values().filter(|v| !v.is_empty()).count(),
        "Built record from manual entry"
    );
    RockRecord::new(tag, tag.as_str(), fields)
}

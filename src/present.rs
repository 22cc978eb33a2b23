//! Turning records into labelled rows for display.

use serde::Serialize;

use crate::model::RockRecord;
use crate::schema::ROCK_TYPE_FIELD;

/// One labelled value ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentedField {
    pub name: String,
    pub label: String,
    pub value: String,
}

/// Split a camelCase identifier into capitalized words.
///
/// ```
/// use rock_analyzer::present::humanize_field_name;
///
/// assert_eq!(humanize_field_name("otherProperties"), "Other Properties");
/// assert_eq!(humanize_field_name("rockType"), "Rock Type");
/// assert_eq!(humanize_field_name("color"), "Color");
/// ```
pub fn humanize_field_name(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if i == 0 {
            label.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            label.push(' ');
            label.push(ch);
        } else {
            label.push(ch);
        }
    }
    label
}

/// Rows for a record: schema fields in display order, then the rock type.
pub fn present(record: &RockRecord) -> Vec<PresentedField> {
    record
        .ordered_fields()
        .into_iter()
        .map(|(spec, value)| (spec.name, value))
        .chain(std::iter::once((ROCK_TYPE_FIELD, record.rock_type())))
        .map(|(name, value)| PresentedField {
            name: name.to_string(),
            label: humanize_field_name(name),
            value: value.to_string(),
        })
        .collect()
}

/// Plain-text rendering, one `Label: value` line per row.
pub fn render_text(record: &RockRecord) -> String {
    let rows = present(record);
    let width = rows.iter().map(|row| row.label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|row| format!("{:width$}  {}", format!("{}:", row.label), row.value, width = width + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_record;
    use crate::schema::RockVariantTag;
    use std::collections::HashMap;

    #[test]
    fn test_humanize_field_name() {
        assert_eq!(humanize_field_name("beddingPlanes"), "Bedding Planes");
        assert_eq!(humanize_field_name("fossilContent"), "Fossil Content");
        assert_eq!(humanize_field_name(""), "");
    }

    #[test]
    fn test_present_orders_rock_type_last() {
        let values = HashMap::from([("cementation".to_string(), "silica".to_string())]);
        let rows = present(&build_record(RockVariantTag::Sandstone, &values));

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].label, "Composition");
        assert_eq!(rows[7].label, "Cementation");
        assert_eq!(rows[7].value, "silica");
        assert_eq!(rows[8].label, "Bedding Layering");
        assert_eq!(rows[9].label, "Rock Type");
        assert_eq!(rows[9].value, "sandstone");
    }

    #[test]
    fn test_render_text_aligns_labels() {
        let record = build_record(RockVariantTag::Granite, &HashMap::new());
        let text = render_text(&record);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("Composition:"));
        assert!(lines[7].starts_with("Rock Type:"));
        assert!(lines[7].ends_with("granite"));
    }
}

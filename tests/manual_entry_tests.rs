#[cfg(test)]
mod manual_entry_tests {
    use rock_analyzer::{RockVariantTag, build_record, fields_for};
    use serde_json::json;
    use std::collections::HashMap;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_slate_manual_entry() {
        let record = build_record(
            RockVariantTag::Slate,
            &values(&[("composition", "quartz"), ("cleavage", "good")]),
        );

        assert_eq!(
            record.to_json(),
            json!({
                "composition": "quartz",
                "color": "",
                "texture": "",
                "hardness": "",
                "density": "",
                "formation": "",
                "otherProperties": "",
                "cleavage": "good",
                "rockType": "slate"
            })
        );
    }

    #[test]
    fn test_keys_are_exactly_schema_fields_plus_rock_type() {
        let supplied = values(&[
            ("composition", "feldspar"),
            ("fossilContent", "ammonites"),
            ("luster", "dull"),
            ("rockType", "basalt"),
        ]);

        for tag in RockVariantTag::ALL {
            let record = build_record(tag, &supplied);
            let mut expected: Vec<&str> = fields_for(tag).iter().map(|f| f.name).collect();
            expected.push("rockType");

            assert_eq!(record.keys(), expected, "keys for {}", tag);
            assert_eq!(record.rock_type(), tag.as_str());
            assert_eq!(record.get("luster"), None);
        }
    }

    #[test]
    fn test_extra_field_for_other_variant_is_ignored() {
        let record = build_record(
            RockVariantTag::Granite,
            &values(&[("fossilContent", "none")]),
        );
        assert_eq!(record.get("fossilContent"), None);
        assert_eq!(record.values().len(), 7);
    }

    #[test]
    fn test_empty_values_give_empty_strings() {
        let record = build_record(RockVariantTag::Shale, &HashMap::new());
        assert!(record.values().values().all(String::is_empty));
        assert_eq!(record.values().len(), 10);
    }

    #[test]
    fn test_serialized_order_matches_display_order() {
        let record = build_record(
            RockVariantTag::Limestone,
            &values(&[("fossilContent", "brachiopods")]),
        );
        let serialized = serde_json::to_string(&record).unwrap();

        let composition = serialized.find("\"composition\"").unwrap();
        let fossil = serialized.find("\"fossilContent\"").unwrap();
        let rock_type = serialized.find("\"rockType\"").unwrap();
        assert!(composition < fossil && fossil < rock_type);
    }
}

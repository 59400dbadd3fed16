//! JSON persistence codec for the mapping trees
//!
//! Encoding is the current nested shape only. Decoding is tolerant: it
//! accepts documents written by earlier releases where a feature entry held
//! a flat action array (no menu level) and migrates those entries under the
//! [`NO_MENU_KEY`] synthetic menu. Shape detection happens per feature
//! entry, so one document may mix both shapes. Malformed fragments are
//! skipped with a warning; only whole-document parse problems degrade to an
//! empty map, never to an error.

use super::{ActionSet, FeatureGrants, MenuGrants, PackageFeatureMap, RoleGrantMap, NO_MENU_KEY};
use serde_json::{Map, Value};
use tracing::warn;

/// Encode a role grant map. Action sets serialize as arrays in set order.
pub fn role_map_to_json(map: &RoleGrantMap) -> Value {
    let mut root = Map::new();
    for (role_id, features) in &map.entries {
        let mut features_obj = Map::new();
        for (feature_id, menus) in features {
            let mut menus_obj = Map::new();
            for (menu_id, actions) in menus {
                let items = actions.iter().cloned().map(Value::String).collect();
                menus_obj.insert(menu_id.clone(), Value::Array(items));
            }
            features_obj.insert(feature_id.clone(), Value::Object(menus_obj));
        }
        root.insert(role_id.clone(), Value::Object(features_obj));
    }
    Value::Object(root)
}

/// Decode a role grant map from a parsed JSON value.
pub fn role_map_from_json(value: &Value) -> RoleGrantMap {
    let mut map = RoleGrantMap::new();
    let Some(root) = value.as_object() else {
        if !value.is_null() {
            warn!("Role grant state is not a JSON object, starting empty");
        }
        return map;
    };

    for (role_id, features_value) in root {
        let Some(features_obj) = features_value.as_object() else {
            warn!("Skipping malformed grant entry for role {}", role_id);
            continue;
        };
        let mut features = FeatureGrants::new();
        for (feature_id, node) in features_obj {
            match node {
                // Legacy flat shape: actions directly under the feature
                Value::Array(items) => {
                    let mut menus = MenuGrants::new();
                    menus.insert(NO_MENU_KEY.to_string(), id_set(items));
                    features.insert(feature_id.clone(), menus);
                }
                // Current nested shape: menu id -> action array
                Value::Object(menu_obj) => {
                    let mut menus = MenuGrants::new();
                    for (menu_id, actions_value) in menu_obj {
                        let Some(items) = actions_value.as_array() else {
                            warn!(
                                "Skipping malformed action list for role {} feature {} menu {}",
                                role_id, feature_id, menu_id
                            );
                            continue;
                        };
                        menus.insert(menu_id.clone(), id_set(items));
                    }
                    features.insert(feature_id.clone(), menus);
                }
                _ => {
                    warn!(
                        "Skipping malformed grant entry for role {} feature {}",
                        role_id, feature_id
                    );
                }
            }
        }
        map.entries.insert(role_id.clone(), features);
    }
    map
}

/// Decode a role grant map from stored text. Unparseable text decodes to an
/// empty map.
pub fn role_map_from_str(text: &str) -> RoleGrantMap {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => role_map_from_json(&value),
        Err(e) => {
            warn!("Role grant state is not valid JSON ({}), starting empty", e);
            RoleGrantMap::new()
        }
    }
}

/// Encode a package assignment map as an object of arrays.
pub fn package_map_to_json(map: &PackageFeatureMap) -> Value {
    let mut root = Map::new();
    for (package_id, features) in &map.entries {
        let items = features.iter().cloned().map(Value::String).collect();
        root.insert(package_id.clone(), Value::Array(items));
    }
    Value::Object(root)
}

/// Decode a package assignment map, same tolerance rules as the role tree.
pub fn package_map_from_json(value: &Value) -> PackageFeatureMap {
    let mut map = PackageFeatureMap::new();
    let Some(root) = value.as_object() else {
        if !value.is_null() {
            warn!("Package assignment state is not a JSON object, starting empty");
        }
        return map;
    };

    for (package_id, features_value) in root {
        let Some(items) = features_value.as_array() else {
            warn!("Skipping malformed assignment entry for package {}", package_id);
            continue;
        };
        map.entries.insert(package_id.clone(), id_set(items));
    }
    map
}

/// Collect leaf id strings: strings kept as-is, integers stringified,
/// anything else dropped.
fn id_set(items: &[Value]) -> ActionSet {
    let mut set = ActionSet::new();
    for item in items {
        match item {
            Value::String(s) => {
                set.insert(s.clone());
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    set.insert(i.to_string());
                }
            }
            _ => {}
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_map_round_trip() {
        let map = RoleGrantMap::new()
            .add_action("1", "10", "100", "5")
            .add_action("1", "10", "100", "6")
            .add_action("2", "11", "-1", "5")
            .assign_feature("3", "12");
        let decoded = role_map_from_json(&role_map_to_json(&map));
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_legacy_flat_entry_migrates_under_synthetic_menu() {
        let value = json!({
            "1": { "10": ["5", "6"] }
        });
        let map = role_map_from_json(&value);
        let menus = &map.get("1").unwrap()["10"];
        assert_eq!(menus.len(), 1);
        assert_eq!(
            menus[NO_MENU_KEY],
            ActionSet::from(["5".to_string(), "6".to_string()])
        );
    }

    #[test]
    fn test_mixed_shapes_in_one_document() {
        let value = json!({
            "1": {
                "10": ["5"],
                "11": { "100": ["6"], "101": ["7"] }
            }
        });
        let map = role_map_from_json(&value);
        let features = map.get("1").unwrap();
        assert_eq!(features["10"][NO_MENU_KEY], ActionSet::from(["5".to_string()]));
        assert_eq!(features["11"]["100"], ActionSet::from(["6".to_string()]));
        assert_eq!(features["11"]["101"], ActionSet::from(["7".to_string()]));
    }

    #[test]
    fn test_integer_leaves_are_stringified() {
        let value = json!({
            "1": { "10": { "100": [5, "6", 7.5, null, true] } }
        });
        let map = role_map_from_json(&value);
        assert_eq!(
            map.get("1").unwrap()["10"]["100"],
            ActionSet::from(["5".to_string(), "6".to_string()])
        );
    }

    #[test]
    fn test_malformed_fragments_are_skipped_not_fatal() {
        let value = json!({
            "1": "not an object",
            "2": { "10": 42, "11": { "100": ["5"] } },
            "3": { "12": { "100": "not an array" } }
        });
        let map = role_map_from_json(&value);
        assert!(!map.contains_role("1"));
        let role2 = map.get("2").unwrap();
        assert!(!role2.contains_key("10"));
        assert_eq!(role2["11"]["100"], ActionSet::from(["5".to_string()]));
        // Feature kept, only its bad menu entry dropped
        assert!(map.get("3").unwrap()["12"].is_empty());
    }

    #[test]
    fn test_non_object_top_level_decodes_empty() {
        assert!(role_map_from_json(&json!([1, 2, 3])).is_empty());
        assert!(role_map_from_json(&json!("text")).is_empty());
        assert!(role_map_from_json(&Value::Null).is_empty());
    }

    #[test]
    fn test_unparseable_text_decodes_empty() {
        assert!(role_map_from_str("{not json").is_empty());
        assert!(role_map_from_str("").is_empty());
    }

    #[test]
    fn test_text_round_trip() {
        let map = RoleGrantMap::new().add_action("4", "20", "200", "8");
        let text = role_map_to_json(&map).to_string();
        assert_eq!(role_map_from_str(&text), map);
    }

    #[test]
    fn test_package_map_round_trip() {
        let map = PackageFeatureMap::new()
            .add_feature("1", "10")
            .add_feature("1", "11")
            .add_feature("2", "10");
        let decoded = package_map_from_json(&package_map_to_json(&map));
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_package_map_tolerates_bad_entries() {
        let value = json!({
            "1": ["10", 11],
            "2": "nope",
            "3": []
        });
        let map = package_map_from_json(&value);
        assert_eq!(
            *map.features_of("1").unwrap(),
            std::collections::BTreeSet::from(["10".to_string(), "11".to_string()])
        );
        assert!(!map.contains_package("2"));
        assert!(map.features_of("3").unwrap().is_empty());
    }

    #[test]
    fn test_package_map_non_object_decodes_empty() {
        assert!(package_map_from_json(&json!(7)).is_empty());
        assert!(package_map_from_json(&Value::Null).is_empty());
    }
}

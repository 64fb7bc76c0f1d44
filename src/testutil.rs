//! Shared fixtures for unit tests: a small school-flavored space.

use crate::meta::{FieldType, Registry, SpaceBuilder, SpaceConfig};
use serde_json::json;

pub fn school_config() -> SpaceConfig {
    serde_json::from_value(json!({
        "identity_model": "auth.user",
        "apps": [
            {
                "label": "auth",
                "models": [
                    {"name": "User", "fields": [
                        {"name": "username", "type": "string", "nullable": false}
                    ]}
                ]
            },
            {
                "label": "school",
                "models": [
                    {"name": "School", "fields": [
                        {"name": "name", "type": "string"},
                        {"name": "established_year", "type": "int"}
                    ]},
                    {"name": "Teacher",
                     "fields": [{"name": "name", "type": "string"}],
                     "relations": [
                        {"name": "school", "kind": "many_to_one", "to": "school", "related_name": "teachers"}
                     ]},
                    {"name": "Student",
                     "fields": [
                        {"name": "name", "type": "string"},
                        {"name": "score", "type": "big_int"}
                     ],
                     "validation": {
                        "name": {"required": true, "max_length": 100}
                     },
                     "relations": [
                        {"name": "school", "kind": "many_to_one", "to": "school"},
                        {"name": "teachers", "kind": "many_to_many", "to": "teacher"},
                        {"name": "owner", "kind": "many_to_one", "to": "auth.user"}
                     ]},
                    {"name": "StudentCard",
                     "fields": [{"name": "card_number", "type": "string"}],
                     "relations": [
                        {"name": "student", "kind": "one_to_one", "to": "student", "related_name": "card"}
                     ]},
                    {"name": "Backpack",
                     "fields": [{"name": "brand", "type": "string"}],
                     "relations": [
                        {"name": "student", "kind": "one_to_one", "to": "student"}
                     ]}
                ]
            }
        ]
    }))
    .expect("school config parses")
}

pub fn school_registry() -> Registry {
    SpaceBuilder::new(school_config())
        .build()
        .expect("school config resolves")
}

/// Same space plus a computed display field on Student.
pub fn school_registry_with_computed() -> Registry {
    SpaceBuilder::new(school_config())
        .computed("school.student", "display_name", "Display name", FieldType::String, |row| {
            let name = row.get("name").and_then(|v| v.as_str()).unwrap_or("?");
            json!(format!("student:{name}"))
        })
        .build()
        .expect("school config resolves")
}

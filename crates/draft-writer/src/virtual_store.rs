//! Cross-reference document (`draft_virtual_store.json`).
//!
//! Three groups:
//! - type 0: a root placeholder, the bundle itself, then one entry per material
//! - type 1: parent/child links, root -> bundle and bundle -> each material
//! - type 2: empty

use serde::Serialize;

use storyreel_common::clock::HostClock;
use storyreel_project_model::bundle::BundleIdentity;
use storyreel_project_model::material::MaterialRef;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualStoreDocument {
    pub draft_materials: Vec<serde_json::Value>,
    pub draft_virtual_store: Vec<StoreGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreGroup {
    #[serde(rename = "type")]
    pub kind: u32,
    pub value: StoreValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoreValues {
    Entries(Vec<StoreEntry>),
    Links(Vec<StoreLink>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreEntry {
    pub creation_time: i64,
    pub display_name: String,
    pub filter_type: u32,
    pub id: String,
    pub import_time: i64,
    pub import_time_us: i64,
    pub sort_sub_type: u32,
    pub sort_type: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreLink {
    pub child_id: String,
    pub parent_id: String,
}

impl StoreEntry {
    fn root() -> Self {
        Self {
            creation_time: 0,
            display_name: String::new(),
            filter_type: 0,
            id: String::new(),
            import_time: 0,
            import_time_us: 0,
            sort_sub_type: 1,
            sort_type: 2,
        }
    }
}

/// Build the document linking `identity` to every material in `materials`.
pub fn build_virtual_store(
    identity: &BundleIdentity,
    materials: &[MaterialRef],
    clock: &HostClock,
) -> VirtualStoreDocument {
    let bundle_entry = StoreEntry {
        creation_time: clock.unix_secs(),
        display_name: identity.name.clone(),
        filter_type: 0,
        id: identity.id.clone(),
        import_time: clock.unix_secs(),
        import_time_us: clock.unix_micros(),
        sort_sub_type: 0,
        sort_type: 0,
    };

    let mut entries = vec![StoreEntry::root(), bundle_entry];
    entries.extend(materials.iter().map(|m| StoreEntry {
        creation_time: m.created_at.timestamp(),
        display_name: m.display_name.clone(),
        filter_type: 0,
        id: m.id.clone(),
        import_time: clock.unix_secs(),
        import_time_us: clock.unix_micros(),
        sort_sub_type: 0,
        sort_type: 0,
    }));

    let mut links = vec![StoreLink {
        child_id: identity.id.clone(),
        parent_id: String::new(),
    }];
    links.extend(materials.iter().map(|m| StoreLink {
        child_id: m.id.clone(),
        parent_id: identity.id.clone(),
    }));

    VirtualStoreDocument {
        draft_materials: Vec::new(),
        draft_virtual_store: vec![
            StoreGroup {
                kind: 0,
                value: StoreValues::Entries(entries),
            },
            StoreGroup {
                kind: 1,
                value: StoreValues::Links(links),
            },
            StoreGroup {
                kind: 2,
                value: StoreValues::Entries(Vec::new()),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::{DateTime, Utc};
    use storyreel_project_model::material::MaterialKind;

    fn material(id: &str, name: &str) -> MaterialRef {
        MaterialRef {
            id: id.into(),
            kind: MaterialKind::Image,
            path: PathBuf::from("/s").join(name),
            display_name: name.into(),
            duration_us: None,
            dimensions: None,
            created_at: DateTime::<Utc>::default(),
            imported_at: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn test_store_layout() {
        let identity = BundleIdentity {
            id: "DRAFT".into(),
            name: "demo".into(),
            path: PathBuf::from("/drafts/demo"),
        };
        let doc = build_virtual_store(
            &identity,
            &[material("m1", "a.jpeg"), material("m2", "b.jpeg")],
            &HostClock::from_unix_secs(100),
        );
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["draft_materials"], serde_json::json!([]));
        let groups = value["draft_virtual_store"].as_array().unwrap();
        assert_eq!(groups.len(), 3);

        let entries = groups[0]["value"].as_array().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0]["sort_type"], 2);
        assert_eq!(entries[1]["id"], "DRAFT");
        assert_eq!(entries[1]["import_time_us"], 100_000_000);
        assert_eq!(entries[2]["display_name"], "a.jpeg");

        let links = groups[1]["value"].as_array().unwrap();
        assert_eq!(links[0], serde_json::json!({"child_id": "DRAFT", "parent_id": ""}));
        assert_eq!(links[2], serde_json::json!({"child_id": "m2", "parent_id": "DRAFT"}));

        assert_eq!(groups[2], serde_json::json!({"type": 2, "value": []}));
    }
}

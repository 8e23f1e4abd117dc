//! Metadata document (`draft_meta_info.json`).
//!
//! In template mode the template's document is kept and only identity,
//! timestamps and the media pool are replaced; everything else the template
//! carries survives untouched.

use serde::Serialize;
use serde_json::{json, Map, Value};

use storyreel_common::clock::HostClock;
use storyreel_project_model::bundle::DraftBundle;
use storyreel_project_model::material::{MaterialKind, MaterialRef};

use crate::content::PHOTO_DURATION_US;

/// `start`/`duration` pair; `-1` means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeHint {
    pub duration: i64,
    pub start: i64,
}

impl RangeHint {
    const UNSET: RangeHint = RangeHint {
        duration: -1,
        start: -1,
    };
}

/// One media pool entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialDescriptor {
    /// File creation time, seconds.
    pub create_time: i64,
    pub duration: u64,
    pub extra_info: String,
    #[serde(rename = "file_Path")]
    pub file_path: String,
    pub height: u32,
    pub id: String,
    /// Seconds.
    pub import_time: i64,
    /// Microseconds, despite the name.
    pub import_time_ms: i64,
    pub item_source: u32,
    pub md5: String,
    pub metetype: &'static str,
    pub roughcut_time_range: RangeHint,
    pub sub_time_range: RangeHint,
    #[serde(rename = "type")]
    pub kind: u32,
    pub width: u32,
}

impl MaterialDescriptor {
    pub fn from_material(material: &MaterialRef, clock: &HostClock) -> Self {
        let (duration, metetype, roughcut) = match material.kind {
            MaterialKind::Image => (PHOTO_DURATION_US, "photo", RangeHint::UNSET),
            MaterialKind::Audio => {
                let duration = material.duration_us.unwrap_or(0);
                (
                    duration,
                    "music",
                    RangeHint {
                        duration: i64::try_from(duration).unwrap_or(i64::MAX),
                        start: 0,
                    },
                )
            }
        };
        let (width, height) = material
            .dimensions
            .map_or((0, 0), |d| (d.width, d.height));

        Self {
            create_time: material.created_at.timestamp(),
            duration,
            extra_info: material.display_name.clone(),
            file_path: material.path_string(),
            height,
            id: material.id.clone(),
            import_time: clock.unix_secs(),
            import_time_ms: clock.unix_micros(),
            item_source: 1,
            md5: String::new(),
            metetype,
            roughcut_time_range: roughcut,
            sub_time_range: RangeHint::UNSET,
            kind: 0,
            width,
        }
    }
}

/// The `draft_materials` list: type 0 holds the media pool, the other
/// types the editor knows are empty.
pub fn draft_materials(materials: &[MaterialRef], clock: &HostClock) -> Value {
    let descriptors: Vec<MaterialDescriptor> = materials
        .iter()
        .map(|m| MaterialDescriptor::from_material(m, clock))
        .collect();

    let mut groups = vec![json!({ "type": 0, "value": descriptors })];
    for kind in [1, 2, 3, 6, 7, 8] {
        groups.push(json!({ "type": kind, "value": [] }));
    }
    Value::Array(groups)
}

/// Replace identity, timestamps and media pool in a metadata document.
pub fn patch_meta(meta: &mut Map<String, Value>, bundle: &DraftBundle, clock: &HostClock) {
    let identity = &bundle.identity;
    let root = identity
        .path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let now_us = clock.unix_micros();

    meta.insert("draft_cover".into(), json!(""));
    meta.insert("draft_name".into(), json!(identity.name));
    meta.insert(
        "draft_fold_path".into(),
        json!(identity.path.to_string_lossy()),
    );
    meta.insert("draft_root_path".into(), json!(root));
    meta.insert("draft_id".into(), json!(identity.id));
    meta.insert("tm_draft_create".into(), json!(now_us));
    meta.insert("tm_draft_modified".into(), json!(now_us));
    meta.insert(
        "tm_duration".into(),
        json!(bundle.timeline.total_duration_us),
    );
    meta.insert(
        "draft_materials".into(),
        draft_materials(&bundle.materials, clock),
    );
}

/// A complete metadata document for bundles built without a template.
pub fn synthesize_meta(bundle: &DraftBundle, clock: &HostClock) -> Map<String, Value> {
    let mut meta = Map::new();
    let defaults = json!({
        "cloud_package_completed_time": "",
        "draft_cloud_capcut_purchase_info": "",
        "draft_cloud_last_action_download": false,
        "draft_cloud_materials": [],
        "draft_cloud_purchase_info": "",
        "draft_cloud_template_id": "",
        "draft_cloud_tutorial_info": "",
        "draft_cloud_videocut_purchase_info": "",
        "draft_deeplink_url": "",
        "draft_enterprise_info": {
            "draft_enterprise_extra": "",
            "draft_enterprise_id": "",
            "draft_enterprise_name": "",
            "enterprise_material": [],
        },
        "draft_is_ai_shorts": false,
        "draft_is_article_video_draft": false,
        "draft_is_from_deeplink": "false",
        "draft_is_invisible": false,
        "draft_materials_copied_info": [],
        "draft_need_rename_folder": false,
        "draft_new_version": "",
        "draft_removable_storage_device": "",
        "draft_segment_extra_info": [],
        "draft_timeline_materials_size_": 0,
        "draft_type": "",
        "tm_draft_cloud_completed": "",
        "tm_draft_cloud_modified": 0,
        "tm_draft_removed": 0,
    });
    if let Value::Object(defaults) = defaults {
        meta.extend(defaults);
    }
    patch_meta(&mut meta, bundle, clock);
    meta
}

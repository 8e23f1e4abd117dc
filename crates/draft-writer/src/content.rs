//! Content document (`draft_content.json`).
//!
//! Field names and nesting follow the editor's own schema; it rejects
//! documents with missing keys, so empty categories are still written.

use serde_json::{json, Value};

use storyreel_common::config::EditorConfig;
use storyreel_project_model::bundle::DraftBundle;
use storyreel_project_model::material::{MaterialKind, MaterialRef};
use storyreel_project_model::timeline::{
    Animation, AnimationPhase, ClipTransform, EffectStyle, Segment, SegmentStyle, TextStyle,
    TimeRange, Track,
};

/// Duration the editor records for still images (three hours).
pub const PHOTO_DURATION_US: u64 = 10_800_000_000;

/// Material categories the editor expects even when empty.
const EMPTY_MATERIAL_CATEGORIES: &[&str] = &[
    "ai_translates",
    "audio_balances",
    "audio_effects",
    "audio_fades",
    "audio_track_indexes",
    "beats",
    "canvases",
    "chromas",
    "color_curves",
    "digital_humans",
    "drafts",
    "effects",
    "flowers",
    "green_screens",
    "handwrites",
    "hsl",
    "images",
    "log_color_wheels",
    "loudnesses",
    "manual_deformations",
    "masks",
    "material_colors",
    "multi_language_refs",
    "placeholders",
    "plugin_effects",
    "primary_color_wheels",
    "realtime_denoises",
    "shapes",
    "smart_crops",
    "smart_relights",
    "sound_channel_mappings",
    "stickers",
    "tail_leaders",
    "text_templates",
    "time_marks",
    "transitions",
    "video_trackings",
    "vocal_beautifys",
    "vocal_separations",
];

/// Per-segment materials produced while serializing tracks.
#[derive(Default)]
struct SegmentMaterials {
    texts: Vec<Value>,
    animations: Vec<Value>,
    effects: Vec<Value>,
    speeds: Vec<Value>,
}

/// Build the content document of `bundle`.
pub fn build_content(bundle: &DraftBundle, editor: &EditorConfig) -> Value {
    let timeline = &bundle.timeline;
    let mut extra = SegmentMaterials::default();

    let tracks: Vec<Value> = timeline
        .tracks_by_render_order()
        .into_iter()
        .map(|track| track_json(track, &mut extra))
        .collect();

    let videos: Vec<Value> = bundle
        .materials
        .iter()
        .filter(|m| m.kind == MaterialKind::Image)
        .map(photo_material)
        .collect();
    let audios: Vec<Value> = bundle
        .materials
        .iter()
        .filter(|m| m.kind == MaterialKind::Audio)
        .map(audio_material)
        .collect();

    let mut materials = serde_json::Map::new();
    for category in EMPTY_MATERIAL_CATEGORIES {
        materials.insert(category.to_string(), json!([]));
    }
    materials.insert("videos".into(), Value::Array(videos));
    materials.insert("audios".into(), Value::Array(audios));
    materials.insert("texts".into(), Value::Array(extra.texts));
    materials.insert("material_animations".into(), Value::Array(extra.animations));
    materials.insert("video_effects".into(), Value::Array(extra.effects));
    materials.insert("speeds".into(), Value::Array(extra.speeds));

    let platform = json!({
        "app_id": editor.app_id,
        "app_source": editor.app_source,
        "app_version": editor.app_version,
        "os": editor.os,
    });

    json!({
        "canvas_config": {
            "height": timeline.canvas.height,
            "ratio": "original",
            "width": timeline.canvas.width,
        },
        "color_space": 0,
        "config": {
            "adjust_max_index": 1,
            "attachment_info": [],
            "combination_max_index": 1,
            "export_range": null,
            "extract_audio_last_index": 1,
            "lyrics_recognition_id": "",
            "lyrics_sync": true,
            "lyrics_taskinfo": [],
            "maintrack_adsorb": true,
            "material_save_mode": 0,
            "original_sound_last_index": 1,
            "record_audio_last_index": 1,
            "sticker_max_index": 1,
            "subtitle_recognition_id": "",
            "subtitle_sync": true,
            "subtitle_taskinfo": [],
            "system_font_list": [],
            "video_mute": false,
            "zoom_info_params": null,
        },
        "cover": null,
        "create_time": 0,
        "duration": timeline.total_duration_us,
        "extra_info": null,
        "fps": editor.fps,
        "free_render_index_mode_on": false,
        "group_container": null,
        "id": uuid::Uuid::new_v4().to_string().to_uppercase(),
        "keyframe_graph_list": [],
        "keyframes": {
            "adjusts": [],
            "audios": [],
            "effects": [],
            "filters": [],
            "handwrites": [],
            "stickers": [],
            "texts": [],
            "videos": [],
        },
        "last_modified_platform": platform.clone(),
        "materials": Value::Object(materials),
        "mutable_config": null,
        "name": "",
        "new_version": editor.new_version,
        "platform": platform,
        "relationships": [],
        "render_index_track_mode_on": false,
        "retouch_cover": null,
        "source": "default",
        "static_cover_image_path": "",
        "time_marks": null,
        "tracks": tracks,
        "update_time": 0,
        "version": editor.version,
    })
}

fn track_json(track: &Track, extra: &mut SegmentMaterials) -> Value {
    let render_index = track.render_index();
    let segments: Vec<Value> = track
        .segments
        .iter()
        .map(|segment| segment_json(segment, track, render_index, extra))
        .collect();

    json!({
        "attribute": 0,
        "flag": track.flag,
        "id": new_id(),
        "is_default_name": false,
        "name": track.name,
        "segments": segments,
        "type": track.kind.as_str(),
    })
}

fn segment_json(
    segment: &Segment,
    track: &Track,
    render_index: u32,
    extra: &mut SegmentMaterials,
) -> Value {
    let mut refs = Vec::new();
    let (material_id, clip, volume) = match &segment.style {
        SegmentStyle::Video { clip, animations } => {
            refs.push(extra.push_speed());
            if !animations.is_empty() {
                refs.push(extra.push_animations(animations, segment.target.duration_us));
            }
            (segment.material_id.clone(), clip_json(clip), 1.0)
        }
        SegmentStyle::Audio { volume } => {
            refs.push(extra.push_speed());
            (segment.material_id.clone(), Value::Null, *volume)
        }
        SegmentStyle::Text { text, style } => {
            let kind = if track.flag == 1 { "subtitle" } else { "text" };
            let id = extra.push_text(text, style, kind);
            (Some(id), clip_json(&style.clip), 1.0)
        }
        SegmentStyle::Effect(effect) => {
            let id = extra.push_effect(effect);
            (Some(id), Value::Null, 1.0)
        }
    };

    json!({
        "cartoon": false,
        "clip": clip,
        "common_keyframes": [],
        "enable_adjust": true,
        "enable_color_correct_adjust": false,
        "enable_color_curves": true,
        "enable_color_match_adjust": false,
        "enable_color_wheels": true,
        "enable_lut": true,
        "enable_smart_color_adjust": false,
        "extra_material_refs": refs,
        "group_id": "",
        "hdr_settings": { "intensity": 1.0, "mode": 1, "nits": 1000 },
        "id": segment.id,
        "intensifies_audio": false,
        "is_placeholder": false,
        "is_tone_modify": false,
        "keyframe_refs": [],
        "last_nonzero_volume": 1.0,
        "material_id": material_id.unwrap_or_default(),
        "render_index": render_index,
        "responsive_layout": {
            "enable": false,
            "horizontal_pos_layout": 0,
            "size_layout": 0,
            "target_follow": "",
            "vertical_pos_layout": 0,
        },
        "reverse": false,
        "source_timerange": segment.source.as_ref().map(range_json),
        "speed": 1.0,
        "target_timerange": range_json(&segment.target),
        "template_id": "",
        "template_scene": "default",
        "track_attribute": 0,
        "track_render_index": track.z_order,
        "uniform_scale": { "on": true, "value": 1.0 },
        "visible": true,
        "volume": volume,
    })
}

impl SegmentMaterials {
    fn push_speed(&mut self) -> String {
        let id = new_id();
        self.speeds.push(json!({
            "curve_speed": null,
            "id": id,
            "mode": 0,
            "speed": 1.0,
            "type": "speed",
        }));
        id
    }

    fn push_animations(&mut self, animations: &[Animation], segment_duration_us: u64) -> String {
        let id = new_id();
        let entries: Vec<Value> = animations
            .iter()
            .map(|a| {
                let (kind, start) = match a.phase {
                    AnimationPhase::Intro => ("in", 0),
                    AnimationPhase::Outro => {
                        ("out", segment_duration_us.saturating_sub(a.duration_us))
                    }
                };
                json!({
                    "anim_adjust_params": null,
                    "category_id": "",
                    "category_name": "",
                    "duration": a.duration_us,
                    "id": a.animation_id,
                    "material_type": "video",
                    "name": a.name,
                    "panel": "video",
                    "path": "",
                    "platform": "all",
                    "request_id": "",
                    "resource_id": a.resource_id,
                    "start": start,
                    "type": kind,
                })
            })
            .collect();
        self.animations.push(json!({
            "animations": entries,
            "id": id,
            "multi_language_current": "none",
            "type": "sticker_animation",
        }));
        id
    }

    fn push_text(&mut self, text: &str, style: &TextStyle, kind: &str) -> String {
        let id = new_id();
        let mut text_style = json!({
            "bold": false,
            "fill": {
                "alpha": 1.0,
                "content": {
                    "render_type": "solid",
                    "solid": { "alpha": 1.0, "color": style.color },
                },
            },
            "italic": false,
            "range": [0, text.chars().count()],
            "size": style.size,
            "underline": false,
        });
        if let Some(border) = &style.border {
            text_style["strokes"] = json!([{
                "content": { "solid": { "alpha": border.alpha, "color": border.color } },
                "width": border.width / 100.0 * 0.2,
            }]);
        }
        let content = json!({ "styles": [text_style], "text": text });
        // Bit 8 marks a text border as present.
        let check_flag = if style.border.is_some() { 15 } else { 7 };

        self.texts.push(json!({
            "add_type": 0,
            "alignment": style.align.code(),
            "background_alpha": 1.0,
            "background_color": "",
            "base_content": "",
            "check_flag": check_flag,
            "content": content.to_string(),
            "fixed_height": -1.0,
            "fixed_width": -1.0,
            "font_size": style.size,
            "force_apply_line_max_width": false,
            "global_alpha": style.alpha,
            "id": id,
            "letter_spacing": 0.0,
            "line_feed": 1,
            "line_max_width": style.max_line_width,
            "line_spacing": 0.02,
            "text_alpha": style.alpha,
            "type": kind,
            "typesetting": 0,
            "words": { "end_time": [], "start_time": [], "text": [] },
        }));
        id
    }

    fn push_effect(&mut self, effect: &EffectStyle) -> String {
        let id = new_id();
        let params: Vec<Value> = effect
            .params
            .iter()
            .map(|p| {
                json!({
                    "default_value": p.value / 100.0,
                    "name": p.name,
                    "value": p.value / 100.0,
                })
            })
            .collect();
        self.effects.push(json!({
            "adjust_params": params,
            "algorithm_artifact_path": "",
            "apply_target_type": 2,
            "apply_time_range": null,
            "category_id": "",
            "category_name": "",
            "common_keyframes": [],
            "disable_effects_keyframe_params": false,
            "effect_id": effect.effect_id,
            "formula_id": "",
            "id": id,
            "name": effect.name,
            "platform": "all",
            "render_index": 11000,
            "request_id": "",
            "resource_id": effect.resource_id,
            "source_platform": 0,
            "time_range": null,
            "track_render_index": 0,
            "type": "video_effect",
            "value": 1.0,
            "version": "",
        }));
        id
    }
}

fn photo_material(material: &MaterialRef) -> Value {
    let (width, height) = material
        .dimensions
        .map_or((0, 0), |d| (d.width, d.height));
    json!({
        "audio_fade": null,
        "category_id": "",
        "category_name": "local",
        "check_flag": 63487,
        "crop": {
            "lower_left_x": 0.0,
            "lower_left_y": 1.0,
            "lower_right_x": 1.0,
            "lower_right_y": 1.0,
            "upper_left_x": 0.0,
            "upper_left_y": 0.0,
            "upper_right_x": 1.0,
            "upper_right_y": 0.0,
        },
        "crop_ratio": "free",
        "crop_scale": 1.0,
        "duration": PHOTO_DURATION_US,
        "height": height,
        "id": material.id,
        "local_material_id": "",
        "material_id": material.id,
        "material_name": material.display_name,
        "media_path": "",
        "path": material.path_string(),
        "type": "photo",
        "width": width,
    })
}

fn audio_material(material: &MaterialRef) -> Value {
    json!({
        "app_id": 0,
        "category_id": "",
        "category_name": "local",
        "check_flag": 1,
        "copyright_limit_type": "none",
        "duration": material.duration_us.unwrap_or(0),
        "effect_id": "",
        "formula_id": "",
        "id": material.id,
        "local_material_id": material.id,
        "music_id": material.id,
        "name": material.display_name,
        "path": material.path_string(),
        "source_platform": 0,
        "type": "extract_music",
        "wave_points": [],
    })
}

fn clip_json(clip: &ClipTransform) -> Value {
    json!({
        "alpha": clip.alpha,
        "flip": { "horizontal": false, "vertical": false },
        "rotation": 0.0,
        "scale": { "x": clip.scale, "y": clip.scale },
        "transform": { "x": clip.transform_x, "y": clip.transform_y },
    })
}

fn range_json(range: &TimeRange) -> Value {
    json!({ "duration": range.duration_us, "start": range.start_us })
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

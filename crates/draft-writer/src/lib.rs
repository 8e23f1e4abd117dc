//! Storyreel Draft Writer
//!
//! Serializes an assembled timeline into the editor's draft bundle:
//! - `draft_content.json`: tracks, segments, and materials in the editor schema
//! - `draft_meta_info.json`: bundle identity and media pool descriptors
//! - `draft_virtual_store.json`: links from the bundle id to every material id
//!
//! The bundle is either patched from a template directory or synthesized
//! from scratch. [`generate_draft`] runs the whole scene-directory-to-bundle
//! pipeline.

pub mod content;
pub mod meta;
pub mod pipeline;
pub mod virtual_store;
pub mod writer;

pub use pipeline::*;
pub use writer::*;

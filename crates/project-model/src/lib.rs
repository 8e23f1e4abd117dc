//! Storyreel Project Model
//!
//! Defines the core data contracts shared by every stage of draft generation:
//! - **Scenes:** Per-scene assets (image candidates, narration, subtitle cues)
//! - **Materials:** Deduplicated references to on-disk images and audio
//! - **Timeline:** Typed tracks of time-ranged segments with style payloads
//! - **Bundle:** A timeline plus material snapshot, identity, and provenance
//!
//! All timeline boundaries are integer microseconds.

pub mod bundle;
pub mod material;
pub mod scene;
pub mod timeline;

pub use bundle::*;
pub use material::*;
pub use scene::*;
pub use timeline::*;

//! Storyreel Assembly
//!
//! Turns a scene directory into a multi-track timeline:
//! - **Resolver:** Group image candidates per scene and pair narration audio with subtitles
//! - **Selection:** Choose one image per scene (seeded random, first, or interactive)
//! - **Registry:** Deduplicate materials by path and probe their metadata
//! - **Assembler:** Lay scenes back-to-back on audio, video, text, and effect tracks
//!
//! Everything here is synchronous; all scene assets must already exist on disk.

pub mod assembler;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod selection;

pub use assembler::*;
pub use probe::*;
pub use registry::*;
pub use resolver::*;
pub use selection::*;

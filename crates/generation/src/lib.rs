//! Storyreel Generation
//!
//! Contracts around the remote image generator that produces scene
//! candidates before a draft is assembled:
//! - **Service:** Submit prompts and poll typed status results
//! - **Task Store:** Per-scene task records with a retention window

pub mod service;
pub mod store;

pub use service::*;
pub use store::*;

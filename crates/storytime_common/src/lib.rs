//! Storytime Common - shared types for the story daemon.
//!
//! Story and settings records, the character/story-type catalog and the
//! text-generation client seam used by `storytimed`.

pub mod catalog;
pub mod error;
pub mod llm_client;
pub mod types;

pub use catalog::*;
pub use error::*;
pub use types::*;

/// Crate version, reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

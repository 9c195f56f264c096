//! Memoria - search engine for personal knowledge records
//!
//! Filtering, boolean and fuzzy matching, relevance ranking, grouping,
//! statistics and duplicate detection over an in-memory set of
//! [`MemoryRecord`]s. Every operation is a pure function of its inputs and an
//! explicit `now` timestamp.

pub mod config;
pub mod entities;
pub mod error;
pub mod events;
pub mod export;
pub mod search;
pub mod types;

pub use error::{MemoriaError, Result};
pub use search::{execute_search, SearchConfig, SearchOutcome};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

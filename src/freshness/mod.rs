//! Freshness detection: mtime bookkeeping for compiled sources.

mod cache;
pub mod mtime;

pub use cache::ModificationCache;
pub use mtime::{get_mtime, mtime_secs};

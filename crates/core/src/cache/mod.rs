//! In-process memoization of module results

pub mod result_cache;

// Re-export the main cache types
pub use result_cache::{CacheKey, ResultCache};

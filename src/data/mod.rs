//! Match data sources and record persistence

pub mod sampler;
pub mod store;

// Re-export commonly used types
pub use sampler::{MatchSource, SyntheticSampler};
pub use store::{default_data_dir, Store, StoreError};

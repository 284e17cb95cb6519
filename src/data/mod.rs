//! Data module - CSV loading, the collision table, and the load cache

mod cache;
mod loader;
mod table;

pub use cache::TableCache;
pub use loader::{DataLoadError, DataLoader, LoadOptions};
pub use table::{columns, CollisionRecord, CollisionTable};

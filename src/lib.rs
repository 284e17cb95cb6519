//! CrashLens - NYC Vehicle Collision CSV Analysis Pipeline
//!
//! Loads a CSV of vehicle-collision records, filters it by date range,
//! hour-of-day, injury count, and injury category, and computes the
//! aggregates a dashboard front-end displays: per-location injury maxima,
//! minute/hour histograms, top-N dangerous streets, and map midpoints.
//!
//! Rendering (maps, 3D density layers, bar charts) is left to consumers;
//! this crate only produces the tabular results those views are fed with.

pub mod data;
pub mod filter;
pub mod params;
pub mod stats;

pub use data::{CollisionRecord, CollisionTable, DataLoadError, DataLoader, LoadOptions, TableCache};
pub use filter::FilterEngine;
pub use params::{FilterParams, InjuryCategory, InvalidFilterParameter};
pub use stats::{Aggregator, StreetInjuries};

//! Stats module - aggregation and clock-display helpers

mod aggregator;

pub use aggregator::{civilian_hour, clock_label, meridiem, Aggregator, StreetInjuries};

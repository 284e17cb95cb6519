//! Filter Parameters Module
//! The enumerated configuration the presentation layer hands to the pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::columns;

/// Parameter rejected at the boundary, before any filter function runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidFilterParameter {
    #[error("Unknown injury category '{0}' (expected pedestrians, cyclists, or motorists)")]
    UnknownCategory(String),
    #[error("top_n must be a positive integer")]
    ZeroTopN,
}

/// The three injury categories partitioning the total injured-persons count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjuryCategory {
    Pedestrians,
    Cyclists,
    Motorists,
}

impl InjuryCategory {
    pub const ALL: [InjuryCategory; 3] = [
        InjuryCategory::Pedestrians,
        InjuryCategory::Cyclists,
        InjuryCategory::Motorists,
    ];

    /// The table column carrying this category's per-record injury count.
    pub fn column(&self) -> &'static str {
        match self {
            InjuryCategory::Pedestrians => columns::INJURED_PEDESTRIANS,
            InjuryCategory::Cyclists => columns::INJURED_CYCLISTS,
            InjuryCategory::Motorists => columns::INJURED_MOTORISTS,
        }
    }
}

impl fmt::Display for InjuryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InjuryCategory::Pedestrians => "pedestrians",
            InjuryCategory::Cyclists => "cyclists",
            InjuryCategory::Motorists => "motorists",
        };
        f.write_str(name)
    }
}

impl FromStr for InjuryCategory {
    type Err = InvalidFilterParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pedestrians" => Ok(InjuryCategory::Pedestrians),
            "cyclists" => Ok(InjuryCategory::Cyclists),
            "motorists" => Ok(InjuryCategory::Motorists),
            other => Err(InvalidFilterParameter::UnknownCategory(other.to_string())),
        }
    }
}

fn default_top_n() -> usize {
    5
}

/// One render pass worth of filter settings.
///
/// Out-of-range hours and inverted date ranges are not rejected here: the
/// filters define those as empty results, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub hour: Option<u32>,
    pub min_injuries: u32,
    pub injury_category: Option<InjuryCategory>,
    pub top_n: usize,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            date_start: None,
            date_end: None,
            hour: None,
            min_injuries: 0,
            injury_category: None,
            top_n: default_top_n(),
        }
    }
}

impl FilterParams {
    pub fn validate(&self) -> Result<(), InvalidFilterParameter> {
        if self.top_n == 0 {
            return Err(InvalidFilterParameter::ZeroTopN);
        }
        Ok(())
    }
}

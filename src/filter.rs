//! Filter Engine Module
//! Pure predicate filters over a CollisionTable; inputs are never mutated.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

use crate::data::{columns, CollisionTable};
use crate::params::InjuryCategory;

/// Stateless filters producing fresh tables from a loaded one.
///
/// Out-of-range numeric inputs are defined as empty results, never errors;
/// the only failures surfaced here are polars evaluation errors.
pub struct FilterEngine;

impl FilterEngine {
    /// Keep records whose timestamp falls on a date in `[start, end]`,
    /// both bounds inclusive. `start == end` selects a single day and
    /// `start > end` yields an empty table.
    pub fn by_date_range(
        table: &CollisionTable,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PolarsResult<CollisionTable> {
        Self::apply(table, date_range_expr(start, end))
    }

    /// Keep records whose hour-of-day equals `hour` (0-23). Idempotent;
    /// hours outside 0-23 simply match nothing.
    pub fn by_hour(table: &CollisionTable, hour: u32) -> PolarsResult<CollisionTable> {
        Self::apply(table, col(columns::DATE_TIME).dt().hour().eq(lit(hour)))
    }

    /// Keep records whose hour-of-day falls in `[start_hour, end_hour]`
    /// inclusive, the window the minute-breakdown view is computed over.
    pub fn by_hour_window(
        table: &CollisionTable,
        start_hour: u32,
        end_hour: u32,
    ) -> PolarsResult<CollisionTable> {
        let hour = col(columns::DATE_TIME).dt().hour();
        Self::apply(
            table,
            hour.clone()
                .gt_eq(lit(start_hour))
                .and(hour.lt_eq(lit(end_hour))),
        )
    }

    /// Keep records with `injured_persons >= threshold`. A threshold of 0
    /// is "no filter" and returns the table unchanged.
    pub fn by_min_injuries(table: &CollisionTable, threshold: u32) -> PolarsResult<CollisionTable> {
        if threshold == 0 {
            return Ok(table.clone());
        }
        Self::apply(table, col(columns::INJURED_PERSONS).gt_eq(lit(threshold)))
    }

    /// Keep records with at least one injury in the given category.
    pub fn by_injury_category(
        table: &CollisionTable,
        category: InjuryCategory,
    ) -> PolarsResult<CollisionTable> {
        Self::apply(table, col(category.column()).gt_eq(lit(1)))
    }

    fn apply(table: &CollisionTable, predicate: Expr) -> PolarsResult<CollisionTable> {
        let df = table.frame().clone().lazy().filter(predicate).collect()?;
        Ok(CollisionTable::new(df))
    }
}

/// Inclusive calendar-date range as a timestamp predicate, shared by the
/// filter engine and the loader's pre-filter.
pub(crate) fn date_range_expr(start: NaiveDate, end: NaiveDate) -> Expr {
    let start_at: NaiveDateTime = start.and_time(NaiveTime::MIN);
    let timestamp = col(columns::DATE_TIME);

    // Half-open upper bound at the midnight after `end`; falls back to the
    // inclusive lower bound alone if `end` has no successor day.
    match end.checked_add_days(Days::new(1)) {
        Some(day_after) => {
            let end_before = day_after.and_time(NaiveTime::MIN);
            timestamp
                .clone()
                .gt_eq(lit(start_at))
                .and(timestamp.lt(lit(end_before)))
        }
        None => timestamp.gt_eq(lit(start_at)),
    }
}

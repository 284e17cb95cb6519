//! CSV Data Loader Module
//! Reads a collision CSV into a normalized CollisionTable using Polars.

use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::table::{columns, CollisionTable};
use crate::filter::FilterEngine;

/// Raw date and time headers, combined into [`columns::DATE_TIME`] at load.
const RAW_CRASH_DATE: &str = "crash_date";
const RAW_CRASH_TIME: &str = "crash_time";

/// Timestamp layout of the combined `crash_date crash_time` string.
const DATE_TIME_FORMAT: &str = "%m/%d/%Y %H:%M";

/// NYC open-data headers (post-lowercasing) mapped to canonical names.
const HEADER_ALIASES: [(&str, &str); 4] = [
    ("number of persons injured", columns::INJURED_PERSONS),
    ("number of pedestrians injured", columns::INJURED_PEDESTRIANS),
    ("number of cyclist injured", columns::INJURED_CYCLISTS),
    ("number of motorist injured", columns::INJURED_MOTORISTS),
];

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Required column missing from CSV: {0}")]
    MissingColumn(String),
}

/// Load-time knobs that fold the two dashboard variants into one pipeline:
/// an optional cap on rows read and an optional date-range pre-filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    /// Read at most this many rows from the file.
    pub row_limit: Option<u32>,
    /// Keep only records whose date falls in this inclusive range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Reads collision CSVs and produces normalized [`CollisionTable`]s.
///
/// Loading is idempotent: the same path and options always yield an equal
/// table. Callers wanting reuse across repeated filter changes go through
/// [`TableCache`](super::TableCache) instead of re-reading the file.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    options: LoadOptions,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load a collision CSV.
    ///
    /// Column names are lowercased and aliased to the canonical set, the
    /// separate date and time fields are combined into one `date/time`
    /// column, and rows missing a coordinate or a parseable timestamp are
    /// dropped. Fails on a missing/unreadable file or a missing required
    /// column; never yields a partial table.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<CollisionTable, DataLoadError> {
        let path = path.as_ref();

        let mut lf = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?;
        if let Some(limit) = self.options.row_limit {
            lf = lf.limit(limit);
        }
        let mut df = lf.collect()?;

        normalize_column_names(&mut df)?;
        check_required_columns(&df)?;

        // Combine crash_date + crash_time into a single datetime column and
        // force numeric dtypes the aggregations rely on.
        let df = df
            .lazy()
            .with_columns([
                combined_timestamp_expr(),
                col(columns::LATITUDE).cast(DataType::Float64),
                col(columns::LONGITUDE).cast(DataType::Float64),
                col(columns::INJURED_PERSONS).cast(DataType::Int64),
                col(columns::INJURED_PEDESTRIANS).cast(DataType::Int64),
                col(columns::INJURED_CYCLISTS).cast(DataType::Int64),
                col(columns::INJURED_MOTORISTS).cast(DataType::Int64),
            ])
            .collect()?;
        let df = df.drop(RAW_CRASH_DATE)?.drop(RAW_CRASH_TIME)?;

        let total = df.height();
        let df = df
            .lazy()
            .filter(
                col(columns::LATITUDE)
                    .is_not_null()
                    .and(col(columns::LONGITUDE).is_not_null())
                    .and(col(columns::DATE_TIME).is_not_null()),
            )
            .collect()?;

        let dropped = total - df.height();
        if dropped > 0 {
            warn!(
                dropped,
                total, "dropped rows missing coordinates or timestamp"
            );
        }
        debug!(rows = df.height(), path = %path.display(), "loaded collision csv");

        let table = CollisionTable::new(df);
        match self.options.date_range {
            Some((start, end)) => Ok(FilterEngine::by_date_range(&table, start, end)?),
            None => Ok(table),
        }
    }
}

/// `concat_str(crash_date, " ", crash_time)` parsed as a datetime.
/// Non-strict: rows that do not match the format become null and are
/// dropped with the coordinate-less rows.
fn combined_timestamp_expr() -> Expr {
    concat_str([col(RAW_CRASH_DATE), col(RAW_CRASH_TIME)], " ", false)
        .str()
        .to_datetime(
            Some(TimeUnit::Microseconds),
            None,
            StrptimeOptions {
                format: Some(DATE_TIME_FORMAT.into()),
                strict: false,
                exact: true,
                cache: true,
            },
            lit("raise"),
        )
        .alias(columns::DATE_TIME)
}

fn normalize_column_names(df: &mut DataFrame) -> Result<(), DataLoadError> {
    // One set_column_names pass: renaming columns one by one afterwards
    // leaves the frame's cached schema stale, and later lazy column lookups
    // resolve against that stale schema.
    let normalized: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| {
            let lowered = name.to_lowercase();
            HEADER_ALIASES
                .iter()
                .find(|(alias, _)| *alias == lowered)
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or(lowered)
        })
        .collect();
    df.set_column_names(normalized)?;
    Ok(())
}

fn check_required_columns(df: &DataFrame) -> Result<(), DataLoadError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut required = vec![
        RAW_CRASH_DATE,
        RAW_CRASH_TIME,
        columns::LATITUDE,
        columns::LONGITUDE,
        columns::LOCATION,
        columns::ON_STREET_NAME,
    ];
    required.extend(HEADER_ALIASES.iter().map(|(_, canonical)| *canonical));

    for column in required {
        if !names.iter().any(|name| name == column) {
            return Err(DataLoadError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

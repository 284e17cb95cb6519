//! Collision Table Module
//! Immutable-after-load wrapper around the collision DataFrame.

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use tracing::warn;

/// Canonical column names after load-time normalization.
pub mod columns {
    /// Combined crash date + time, one datetime per record.
    pub const DATE_TIME: &str = "date/time";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const LOCATION: &str = "location";
    pub const ON_STREET_NAME: &str = "on_street_name";
    pub const INJURED_PERSONS: &str = "injured_persons";
    pub const INJURED_PEDESTRIANS: &str = "injured_pedestrians";
    pub const INJURED_CYCLISTS: &str = "injured_cyclists";
    pub const INJURED_MOTORISTS: &str = "injured_motorists";
}

/// One collision record, materialized from a table row for raw display
/// and map plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionRecord {
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub on_street_name: Option<String>,
    pub injured_persons: i64,
    pub injured_pedestrians: i64,
    pub injured_cyclists: i64,
    pub injured_motorists: i64,
}

/// An ordered, immutable collection of collision records.
///
/// Created once per source file by the loader; every filter and aggregation
/// produces a fresh table or scalar, never mutating this one. Invariant:
/// every row has a non-null timestamp, latitude, and longitude.
#[derive(Debug, Clone)]
pub struct CollisionTable {
    df: DataFrame,
}

impl CollisionTable {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// The underlying DataFrame, for consumers that speak polars directly.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Number of records in the table.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Materialize every row as a typed [`CollisionRecord`], in table order.
    pub fn records(&self) -> PolarsResult<Vec<CollisionRecord>> {
        let timestamps = self
            .df
            .column(columns::DATE_TIME)?
            .as_materialized_series()
            .cast(&DataType::Int64)?;
        let timestamps = timestamps.i64()?;
        let latitudes = self
            .df
            .column(columns::LATITUDE)?
            .as_materialized_series()
            .f64()?;
        let longitudes = self
            .df
            .column(columns::LONGITUDE)?
            .as_materialized_series()
            .f64()?;
        let locations = self
            .df
            .column(columns::LOCATION)?
            .as_materialized_series()
            .str()?;
        let streets = self
            .df
            .column(columns::ON_STREET_NAME)?
            .as_materialized_series()
            .str()?;
        let persons = self.injury_column(columns::INJURED_PERSONS)?;
        let pedestrians = self.injury_column(columns::INJURED_PEDESTRIANS)?;
        let cyclists = self.injury_column(columns::INJURED_CYCLISTS)?;
        let motorists = self.injury_column(columns::INJURED_MOTORISTS)?;

        let mut records = Vec::with_capacity(self.df.height());
        for i in 0..self.df.height() {
            // Nulls in these three are dropped at load time; a hand-built
            // frame can violate that, so skip the row loudly rather than
            // panic.
            let (Some(micros), Some(latitude), Some(longitude)) =
                (timestamps.get(i), latitudes.get(i), longitudes.get(i))
            else {
                warn!(row = i, "skipping record with null timestamp or coordinate");
                continue;
            };
            let Some(timestamp) = DateTime::from_timestamp_micros(micros) else {
                warn!(row = i, micros, "skipping record with out-of-range timestamp");
                continue;
            };

            records.push(CollisionRecord {
                timestamp: timestamp.naive_utc(),
                latitude,
                longitude,
                location: locations.get(i).map(str::to_string),
                on_street_name: streets.get(i).map(str::to_string),
                injured_persons: persons.i64()?.get(i).unwrap_or(0),
                injured_pedestrians: pedestrians.i64()?.get(i).unwrap_or(0),
                injured_cyclists: cyclists.i64()?.get(i).unwrap_or(0),
                injured_motorists: motorists.i64()?.get(i).unwrap_or(0),
            });
        }

        Ok(records)
    }

    fn injury_column(&self, name: &str) -> PolarsResult<Series> {
        self.df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Int64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::table_from_rows;

    #[test]
    fn test_records_in_table_order() {
        let table = table_from_rows(&[
            "05/01/2019,8:15,40.70,-73.99,\"(40.70, -73.99)\",BROADWAY,2,1,0,1",
            "05/02/2019,17:45,40.71,-73.98,\"(40.71, -73.98)\",CANAL ST,0,0,0,0",
        ]);
        let records = table.records().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].on_street_name.as_deref(), Some("BROADWAY"));
        assert_eq!(records[0].injured_persons, 2);
        assert_eq!(records[0].timestamp.to_string(), "2019-05-01 08:15:00");
        assert_eq!(records[1].on_street_name.as_deref(), Some("CANAL ST"));
        assert_eq!(records[1].timestamp.to_string(), "2019-05-02 17:45:00");
    }

    #[test]
    fn test_records_keep_optional_fields_null() {
        let table = table_from_rows(&["05/01/2019,8:15,40.70,-73.99,,,1,0,0,0"]);
        let records = table.records().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, None);
        assert_eq!(records[0].on_street_name, None);
    }

    #[test]
    fn test_records_skip_rows_with_nulled_coordinates() {
        let table = table_from_rows(&[
            "05/01/2019,8:15,40.70,-73.99,LOC A,BROADWAY,1,0,0,0",
            "05/01/2019,9:30,40.71,-73.98,LOC B,CANAL ST,2,0,0,0",
        ]);
        // Null out one latitude to break the loader-enforced invariant.
        let df = table
            .frame()
            .clone()
            .lazy()
            .with_columns([when(col(columns::LOCATION).eq(lit("LOC B")))
                .then(lit(NULL).cast(DataType::Float64))
                .otherwise(col(columns::LATITUDE))
                .alias(columns::LATITUDE)])
            .collect()
            .unwrap();

        let records = CollisionTable::new(df).records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location.as_deref(), Some("LOC A"));
    }

    #[test]
    fn test_empty_table() {
        let table = table_from_rows(&[]);
        assert!(table.is_empty());
        assert!(table.records().unwrap().is_empty());
    }
}

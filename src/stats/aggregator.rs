//! Aggregation Module
//! Pure reducers over a CollisionTable: histograms, rankings, map bounds.

use polars::prelude::*;
use serde::Serialize;

use crate::data::{columns, CollisionTable};
use crate::params::InjuryCategory;

/// One entry of a dangerous-street ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreetInjuries {
    pub street: String,
    pub injured: i64,
}

/// Stateless reducers recomputed from scratch on every render pass.
pub struct Aggregator;

impl Aggregator {
    /// Maximum per-location sum of injured persons, used to bound the
    /// injury slider. Records without a location identifier are excluded
    /// from the grouping. Returns 0 for an empty table.
    pub fn max_injuries_by_location(table: &CollisionTable) -> PolarsResult<u64> {
        let df = table
            .frame()
            .clone()
            .lazy()
            .filter(col(columns::LOCATION).is_not_null())
            .group_by([col(columns::LOCATION)])
            .agg([col(columns::INJURED_PERSONS).sum().alias("injured_total")])
            .select([col("injured_total").max()])
            .collect()?;

        let max = df
            .column("injured_total")?
            .as_materialized_series()
            .cast(&DataType::Int64)?
            .i64()?
            .get(0)
            .unwrap_or(0);
        Ok(max.max(0) as u64)
    }

    /// Record counts bucketed by the minute component of the timestamp,
    /// in minute order. Sums to the table's row count.
    pub fn minute_histogram(table: &CollisionTable) -> PolarsResult<[u64; 60]> {
        let mut buckets = [0u64; 60];
        Self::fill_component_histogram(table, &mut buckets, |dt| dt.dt().minute())?;
        Ok(buckets)
    }

    /// Record counts bucketed by the hour component of the timestamp,
    /// in hour order. Sums to the table's row count.
    pub fn hour_histogram(table: &CollisionTable) -> PolarsResult<[u64; 24]> {
        let mut buckets = [0u64; 24];
        Self::fill_component_histogram(table, &mut buckets, |dt| dt.dt().hour())?;
        Ok(buckets)
    }

    /// Top `n` streets ranked by per-record injuries in `category`.
    ///
    /// Only records with at least one such injury and a non-null street
    /// name qualify; the sort is stable, so ties keep their original row
    /// order.
    pub fn top_streets_by_category(
        table: &CollisionTable,
        category: InjuryCategory,
        n: usize,
    ) -> PolarsResult<Vec<StreetInjuries>> {
        let injury_col = category.column();
        let df = table
            .frame()
            .clone()
            .lazy()
            .filter(col(injury_col).gt_eq(lit(1)))
            .select([col(columns::ON_STREET_NAME), col(injury_col)])
            .drop_nulls(None)
            .sort(
                [injury_col],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .limit(n as IdxSize)
            .collect()?;

        let streets = df
            .column(columns::ON_STREET_NAME)?
            .as_materialized_series()
            .str()?
            .clone();
        let injuries = df
            .column(injury_col)?
            .as_materialized_series()
            .cast(&DataType::Int64)?;
        let injuries = injuries.i64()?;

        let mut ranking = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            if let (Some(street), Some(injured)) = (streets.get(i), injuries.get(i)) {
                ranking.push(StreetInjuries {
                    street: street.to_string(),
                    injured,
                });
            }
        }
        Ok(ranking)
    }

    /// Mean latitude/longitude, the point the map view is centered on.
    /// `None` for an empty table.
    pub fn geographic_midpoint(table: &CollisionTable) -> PolarsResult<Option<(f64, f64)>> {
        if table.is_empty() {
            return Ok(None);
        }

        let latitude = table
            .frame()
            .column(columns::LATITUDE)?
            .as_materialized_series()
            .f64()?
            .mean();
        let longitude = table
            .frame()
            .column(columns::LONGITUDE)?
            .as_materialized_series()
            .f64()?
            .mean();

        Ok(latitude.zip(longitude))
    }

    fn fill_component_histogram(
        table: &CollisionTable,
        buckets: &mut [u64],
        component: impl Fn(Expr) -> Expr,
    ) -> PolarsResult<()> {
        let df = table
            .frame()
            .clone()
            .lazy()
            .select([component(col(columns::DATE_TIME)).alias("component")])
            .collect()?;

        let values = df
            .column("component")?
            .as_materialized_series()
            .cast(&DataType::UInt32)?;
        for value in values.u32()?.into_iter().flatten() {
            if let Some(bucket) = buckets.get_mut(value as usize) {
                *bucket += 1;
            }
        }
        Ok(())
    }
}

/// Map a 24-hour value to its 12-hour display value: 0, 12, and 24 all
/// render as 12, everything else as `hour % 12`.
pub fn civilian_hour(hour: u32) -> u32 {
    match hour % 24 {
        0 | 12 => 12,
        h => h % 12,
    }
}

/// AM/PM suffix for a 24-hour value. Hour 24 wraps to midnight.
pub fn meridiem(hour: u32) -> &'static str {
    if hour % 24 < 12 {
        "AM"
    } else {
        "PM"
    }
}

/// Display label for an hour boundary, e.g. `17` renders as `"5:00 PM"`.
pub fn clock_label(hour: u32) -> String {
    format!("{}:00 {}", civilian_hour(hour), meridiem(hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::table_from_rows;

    fn sample_table() -> CollisionTable {
        table_from_rows(&[
            "05/01/2019,5:10,40.70,-73.99,LOC A,BROADWAY,2,1,0,0",
            "05/01/2019,5:10,40.71,-73.98,LOC A,BROADWAY,3,0,0,2",
            "05/01/2019,9:45,40.72,-73.97,LOC B,CANAL ST,4,2,1,0",
            "05/02/2019,17:30,40.73,-73.96,LOC C,HOUSTON ST,1,1,0,0",
        ])
    }

    #[test]
    fn test_max_injuries_by_location() {
        let table = sample_table();
        // LOC A sums to 5, LOC B to 4, LOC C to 1.
        assert_eq!(Aggregator::max_injuries_by_location(&table).unwrap(), 5);
    }

    #[test]
    fn test_max_injuries_empty_table_is_zero() {
        let empty = table_from_rows(&[]);
        assert_eq!(Aggregator::max_injuries_by_location(&empty).unwrap(), 0);
    }

    #[test]
    fn test_max_injuries_ignores_null_locations() {
        let table = table_from_rows(&[
            "05/01/2019,5:10,40.70,-73.99,,BROADWAY,9,0,0,0",
            "05/01/2019,6:10,40.70,-73.99,LOC A,BROADWAY,2,0,0,0",
        ]);
        assert_eq!(Aggregator::max_injuries_by_location(&table).unwrap(), 2);
    }

    #[test]
    fn test_hour_histogram() {
        let table = sample_table();
        let hist = Aggregator::hour_histogram(&table).unwrap();

        assert_eq!(hist[5], 2);
        assert_eq!(hist[9], 1);
        assert_eq!(hist[17], 1);
        assert_eq!(hist.iter().sum::<u64>(), table.height() as u64);
    }

    #[test]
    fn test_minute_histogram() {
        let table = sample_table();
        let hist = Aggregator::minute_histogram(&table).unwrap();

        assert_eq!(hist[10], 2);
        assert_eq!(hist[45], 1);
        assert_eq!(hist[30], 1);
        assert_eq!(hist.iter().sum::<u64>(), table.height() as u64);
    }

    #[test]
    fn test_histograms_on_empty_table() {
        let empty = table_from_rows(&[]);
        assert_eq!(
            Aggregator::hour_histogram(&empty).unwrap().iter().sum::<u64>(),
            0
        );
        assert_eq!(
            Aggregator::minute_histogram(&empty)
                .unwrap()
                .iter()
                .sum::<u64>(),
            0
        );
    }

    #[test]
    fn test_top_streets_sorted_and_truncated() {
        let table = table_from_rows(&[
            "05/01/2019,5:00,40.70,-73.99,L1,BROADWAY,3,3,0,0",
            "05/01/2019,6:00,40.70,-73.99,L2,CANAL ST,1,1,0,0",
            "05/01/2019,7:00,40.70,-73.99,L3,HOUSTON ST,5,5,0,0",
            "05/01/2019,8:00,40.70,-73.99,L4,DELANCEY ST,0,0,2,0",
            "05/01/2019,9:00,40.70,-73.99,L5,BOWERY,2,2,0,0",
        ]);

        let top = Aggregator::top_streets_by_category(&table, InjuryCategory::Pedestrians, 3)
            .unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].street, "HOUSTON ST");
        assert_eq!(top[0].injured, 5);
        assert_eq!(top[1].street, "BROADWAY");
        assert_eq!(top[2].street, "BOWERY");
        assert!(top.windows(2).all(|w| w[0].injured >= w[1].injured));
    }

    #[test]
    fn test_top_streets_skips_null_street_names() {
        let table = table_from_rows(&[
            "05/01/2019,5:00,40.70,-73.99,L1,,4,4,0,0",
            "05/01/2019,6:00,40.70,-73.99,L2,CANAL ST,1,1,0,0",
        ]);

        let top =
            Aggregator::top_streets_by_category(&table, InjuryCategory::Pedestrians, 5).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].street, "CANAL ST");
    }

    #[test]
    fn test_top_streets_stable_on_ties() {
        let table = table_from_rows(&[
            "05/01/2019,5:00,40.70,-73.99,L1,FIRST AVE,2,2,0,0",
            "05/01/2019,6:00,40.70,-73.99,L2,SECOND AVE,2,2,0,0",
        ]);

        let top =
            Aggregator::top_streets_by_category(&table, InjuryCategory::Pedestrians, 5).unwrap();
        assert_eq!(top[0].street, "FIRST AVE");
        assert_eq!(top[1].street, "SECOND AVE");
    }

    #[test]
    fn test_geographic_midpoint() {
        let table = table_from_rows(&[
            "05/01/2019,5:00,40.00,-74.00,L1,BROADWAY,0,0,0,0",
            "05/01/2019,6:00,41.00,-73.00,L2,CANAL ST,0,0,0,0",
        ]);

        let (lat, lon) = Aggregator::geographic_midpoint(&table).unwrap().unwrap();
        assert!((lat - 40.5).abs() < 1e-9);
        assert!((lon + 73.5).abs() < 1e-9);
    }

    #[test]
    fn test_geographic_midpoint_empty_is_none() {
        let empty = table_from_rows(&[]);
        assert_eq!(Aggregator::geographic_midpoint(&empty).unwrap(), None);
    }

    #[test]
    fn test_civilian_hour() {
        assert_eq!(civilian_hour(0), 12);
        assert_eq!(civilian_hour(1), 1);
        assert_eq!(civilian_hour(11), 11);
        assert_eq!(civilian_hour(12), 12);
        assert_eq!(civilian_hour(13), 1);
        assert_eq!(civilian_hour(23), 11);
        assert_eq!(civilian_hour(24), 12);
    }

    #[test]
    fn test_meridiem_and_labels() {
        assert_eq!(meridiem(0), "AM");
        assert_eq!(meridiem(11), "AM");
        assert_eq!(meridiem(12), "PM");
        assert_eq!(meridiem(23), "PM");
        assert_eq!(meridiem(24), "AM");
        assert_eq!(clock_label(13), "1:00 PM");
        assert_eq!(clock_label(0), "12:00 AM");
    }
}

//! # High/Low Tide Pivot
//!
//! The `high_low` product returns one record per tide event, tagged with a
//! two-character extrema code in its `ty` field:
//!
//! | tag | event | match |
//! |---|---|---|
//! | `"HH"` | higher high | exact |
//! | `"H "` | high | exact |
//! | `"L "` | low | substring |
//! | `"LL"` | lower low | substring |
//!
//! Those events are pivoted into one row per calendar day. Each extremum
//! contributes two columns, the event's timestamp and its water level, and
//! days missing an extremum simply hold nulls there (an outer join).
//!
//! When a day has more than one event of a kind, the one with the highest
//! water level is kept. This applies to the low groups too: a day with two
//! "L " events keeps the higher of the two lows. An event whose level is
//! unreadable still counts; it only loses to events with a readable level.

use crate::error::Result;
use crate::fetch::RawRecord;
use crate::normalize::{code_for, datetime_column, numeric, raw_column, record_timestamps};
use crate::product::{Product, DATE_TIME};
use chrono::NaiveDate;
use polars::prelude::{
    col, lit, Column, DataFrame, DateChunked, IntoLazy, IntoSeries, LazyFrame,
    SortMultipleOptions,
};

const EVENT_TIME: &str = "event_time";
const KIND: &str = "kind";
const LEVEL: &str = "water_level";

/// Kind of tide event, in output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    HigherHigh,
    High,
    Low,
    LowerLow,
}

impl Extremum {
    pub const ALL: [Extremum; 4] = [
        Extremum::HigherHigh,
        Extremum::High,
        Extremum::Low,
        Extremum::LowerLow,
    ];

    /// Classify a raw `ty` tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "HH" => Some(Extremum::HigherHigh),
            "H " => Some(Extremum::High),
            t if t.contains("LL") => Some(Extremum::LowerLow),
            t if t.contains("L ") => Some(Extremum::Low),
            _ => None,
        }
    }

    /// Suffix used in this extremum's column names.
    pub fn label(self) -> &'static str {
        match self {
            Extremum::HigherHigh => "HH",
            Extremum::High => "H",
            Extremum::Low => "L",
            Extremum::LowerLow => "LL",
        }
    }
}

/// Pivot raw `high_low` records into one row per day.
///
/// Columns, in order: `date_time` (the calendar date), `date_time_HH`,
/// `HH_water_level`, `date_time_H`, `H_water_level`, `date_time_L`,
/// `L_water_level`, `date_time_LL`, `LL_water_level`.
pub fn pivot(records: &[RawRecord]) -> Result<DataFrame> {
    let tag_code = code_for(Product::HighLow, "high_low").unwrap_or("ty");
    let date_code = code_for(Product::HighLow, DATE_TIME).unwrap_or("t");
    let level_code = code_for(Product::HighLow, LEVEL).unwrap_or("v");

    let stamps = record_timestamps(records, date_code)?;
    let days: Column = DateChunked::from_naive_date(
        DATE_TIME.into(),
        stamps.iter().map(|t| t.date()).collect::<Vec<NaiveDate>>(),
    )
    .into_series()
    .into();
    let kinds: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.get(tag_code).and_then(Extremum::from_tag).map(Extremum::label))
        .collect();

    let events = DataFrame::new(vec![
        days,
        datetime_column(EVENT_TIME, stamps),
        Column::new(KIND.into(), kinds),
        raw_column(LEVEL, records, level_code),
    ])?
    .lazy()
    .with_column(numeric(col(LEVEL)).alias(LEVEL))
    .filter(col(KIND).is_not_null());

    let mut table = events.clone().select([col(DATE_TIME).unique()]);
    for kind in Extremum::ALL {
        table = table.left_join(daily(events.clone(), kind), col(DATE_TIME), col(DATE_TIME));
    }

    let frame = table
        .sort([DATE_TIME], SortMultipleOptions::default())
        .collect()?;
    Ok(frame)
}

/// The retained event of `kind` for each day it occurs on.
fn daily(events: LazyFrame, kind: Extremum) -> LazyFrame {
    let by_level = SortMultipleOptions::default()
        .with_order_descending(true)
        .with_nulls_last(true)
        .with_maintain_order(true);
    events
        .filter(col(KIND).eq(lit(kind.label())))
        .sort([LEVEL], by_level)
        .group_by_stable([col(DATE_TIME)])
        .agg([
            col(EVENT_TIME)
                .first()
                .alias(format!("{DATE_TIME}_{}", kind.label())),
            col(LEVEL).first().alias(format!("{}_{LEVEL}", kind.label())),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoopsError;
    use crate::tests::frames::{dates, floats, names, timestamps};
    use chrono::NaiveDateTime;

    fn event(t: &str, v: &str, ty: &str) -> RawRecord {
        [("t", t), ("v", v), ("ty", ty), ("f", "0,0,0")]
            .into_iter()
            .collect()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 1, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_tag_classification() {
        assert_eq!(Extremum::from_tag("HH"), Some(Extremum::HigherHigh));
        assert_eq!(Extremum::from_tag("H "), Some(Extremum::High));
        assert_eq!(Extremum::from_tag("L "), Some(Extremum::Low));
        assert_eq!(Extremum::from_tag("LL"), Some(Extremum::LowerLow));
        assert_eq!(Extremum::from_tag("H"), None);
        assert_eq!(Extremum::from_tag(""), None);
    }

    #[test]
    fn test_column_layout() {
        let frame = pivot(&[event("2015-01-01 03:12", "2.5", "HH")]).unwrap();
        assert_eq!(
            names(&frame),
            [
                "date_time",
                "date_time_HH",
                "HH_water_level",
                "date_time_H",
                "H_water_level",
                "date_time_L",
                "L_water_level",
                "date_time_LL",
                "LL_water_level",
            ]
        );
        assert_eq!(dates(&frame, "date_time"), [Some(date(1))]);
    }

    #[test]
    fn test_same_day_higher_highs_keep_larger() {
        let records = vec![
            event("2015-01-01 03:12", "2.5", "HH"),
            event("2015-01-01 15:40", "2.9", "HH"),
        ];
        let frame = pivot(&records).unwrap();
        assert_eq!(frame.height(), 1);
        assert_eq!(floats(&frame, "HH_water_level"), [Some(2.9)]);
        assert_eq!(timestamps(&frame, "date_time_HH"), [Some(at(1, 15, 40))]);
    }

    #[test]
    fn test_lows_also_keep_larger() {
        let records = vec![
            event("2015-01-01 09:00", "-0.4", "L "),
            event("2015-01-01 21:00", "0.1", "L "),
        ];
        let frame = pivot(&records).unwrap();
        assert_eq!(floats(&frame, "L_water_level"), [Some(0.1)]);
    }

    #[test]
    fn test_outer_join_keeps_partial_days() {
        let records = vec![
            event("2015-01-01 03:12", "2.5", "HH"),
            event("2015-01-01 09:30", "-0.3", "LL"),
            event("2015-01-02 04:00", "1.8", "H "),
            event("2015-01-02 10:15", "0.2", "L "),
        ];
        let frame = pivot(&records).unwrap();
        assert_eq!(dates(&frame, "date_time"), [Some(date(1)), Some(date(2))]);
        assert_eq!(floats(&frame, "HH_water_level"), [Some(2.5), None]);
        assert_eq!(floats(&frame, "H_water_level"), [None, Some(1.8)]);
        assert_eq!(floats(&frame, "L_water_level"), [None, Some(0.2)]);
        assert_eq!(floats(&frame, "LL_water_level"), [Some(-0.3), None]);
        assert_eq!(timestamps(&frame, "date_time_H")[0], None);
    }

    #[test]
    fn test_unreadable_level_keeps_its_day() {
        let records = vec![
            event("2015-01-01 03:12", "", "HH"),
            event("2015-01-01 15:12", "1.1", "HH"),
            event("2015-01-02 03:12", "n/a", "HH"),
        ];
        let frame = pivot(&records).unwrap();
        assert_eq!(dates(&frame, "date_time"), [Some(date(1)), Some(date(2))]);
        // a readable level beats an unreadable one on the same day
        assert_eq!(floats(&frame, "HH_water_level"), [Some(1.1), None]);
        assert_eq!(
            timestamps(&frame, "date_time_HH"),
            [Some(at(1, 15, 12)), Some(at(2, 3, 12))]
        );
    }

    #[test]
    fn test_untagged_events_are_ignored() {
        let records = vec![
            event("2015-01-01 03:12", "2.5", "HH"),
            event("2015-01-03 03:12", "2.5", "??"),
        ];
        let frame = pivot(&records).unwrap();
        assert_eq!(dates(&frame, "date_time"), [Some(date(1))]);
    }

    #[test]
    fn test_empty_input() {
        let frame = pivot(&[]).unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.width(), 9);
    }

    #[test]
    fn test_bad_timestamp() {
        let err = pivot(&[event("soon", "1.0", "HH")]).unwrap_err();
        assert!(matches!(err, CoopsError::ResponseParse { .. }));
    }
}

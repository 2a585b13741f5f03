//! # Schema Normalization
//!
//! Converts concatenated [`RawRecord`]s into a Polars [`DataFrame`] with
//! stable column names. Everything product-specific comes from the product's
//! [`ProductSpec`](crate::product::ProductSpec); this module only applies it.
//!
//! ## Pipeline
//! 1. **Rename**: raw field codes (`t`, `v`, `s`, …) become domain names
//!    (`date_time`, `water_level`, `sigma`, …); unknown codes keep their name
//! 2. **Coerce**: text columns stay text, every other column is cast to
//!    `Float64`, unreadable values become null
//! 3. **Index**: `date_time` is parsed into the leading `Datetime` column,
//!    sorted ascending; a timestamp repeated at a window boundary keeps its
//!    first row
//! 4. **Resample**: water levels (and currents requested hourly) collapse to
//!    one row per hour
//!
//! The `high_low` product takes a different path, see [`crate::extrema`].

use crate::error::{CoopsError, Result};
use crate::extrema;
use crate::fetch::RawRecord;
use crate::product::{Layout, Product, DATE_TIME};
use crate::request::Interval;
use chrono::{NaiveDateTime, Timelike};
use polars::prelude::{
    col, lit, Column, DataFrame, DataType, DatetimeChunked, Duration, DynamicGroupOptions, Expr,
    IntoLazy, IntoSeries, SortMultipleOptions, TimeUnit, UniqueKeepStrategy, NULL,
};
use std::collections::HashMap;
use tracing::debug;

/// Timestamp layouts the service uses in `t` fields.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Normalize raw records of `product` into a frame.
///
/// `interval` is the interval the data was requested with; it selects the
/// predictions hi/lo rename and the currents hourly resample.
///
/// # Example
/// ```
/// use coops_lib::{normalize, Product, RawRecord};
///
/// let records: Vec<RawRecord> = vec![
///     [("t", "2015-01-01 00:00"), ("v", "1.02"), ("f", "0,0,0")].into_iter().collect(),
///     [("t", "2015-01-01 00:06"), ("v", "bad"), ("f", "0,0,0")].into_iter().collect(),
/// ];
/// let frame = normalize(&records, Product::AirTemperature, None).unwrap();
///
/// assert_eq!(frame.width(), 3);
/// assert_eq!(frame.column("air_temp").unwrap().null_count(), 1);
/// ```
pub fn normalize(
    records: &[RawRecord],
    product: Product,
    interval: Option<Interval>,
) -> Result<DataFrame> {
    let frame = match product.spec().layout {
        Layout::DailyExtrema => extrema::pivot(records)?,
        Layout::TimeSeries => time_series(records, product, interval)?,
    };
    debug!(
        product = product.as_str(),
        records = records.len(),
        rows = frame.height(),
        "normalized"
    );
    Ok(frame)
}

/// Normalize with the product given by its service name.
///
/// Fails with [`CoopsError::UnsupportedProduct`] for names this crate does
/// not know.
pub fn normalize_named(
    records: &[RawRecord],
    product: &str,
    interval: Option<Interval>,
) -> Result<DataFrame> {
    normalize(records, product.parse()?, interval)
}

/// Parse a service timestamp such as `2015-01-01 00:06`.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Parse the timestamp field of every record, failing on the first bad one.
pub(crate) fn record_timestamps(
    records: &[RawRecord],
    code: &str,
) -> Result<Vec<NaiveDateTime>> {
    records
        .iter()
        .map(|record| {
            let raw = record.get(code).ok_or_else(|| {
                CoopsError::response_parse(format!("record has no {code:?} field"))
            })?;
            parse_timestamp(raw).ok_or_else(|| {
                CoopsError::response_parse(format!("unreadable timestamp {raw:?}"))
            })
        })
        .collect()
}

/// Raw code that a product renames to `name`, if any.
pub(crate) fn code_for(product: Product, name: &str) -> Option<&'static str> {
    product
        .spec()
        .renames
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| *code)
}

/// Millisecond `Datetime` column.
pub(crate) fn datetime_column(
    name: &str,
    values: impl IntoIterator<Item = NaiveDateTime>,
) -> Column {
    DatetimeChunked::from_naive_datetime(name.into(), values, TimeUnit::Milliseconds)
        .into_series()
        .into()
}

/// String column holding one raw field of every record.
pub(crate) fn raw_column(name: &str, records: &[RawRecord], code: &str) -> Column {
    let values: Vec<Option<&str>> = records.iter().map(|r| r.get(code)).collect();
    Column::new(name.into(), values)
}

/// Cast to `Float64`; text that does not parse, and NaN, become null.
pub(crate) fn numeric(expr: Expr) -> Expr {
    expr.cast(DataType::Float64).fill_nan(lit(NULL))
}

fn time_series(
    records: &[RawRecord],
    product: Product,
    interval: Option<Interval>,
) -> Result<DataFrame> {
    let spec = product.spec();
    let renames: HashMap<&str, &str> = spec.renames_for(interval).copied().collect();
    let date_code = code_for(product, DATE_TIME).unwrap_or("t");

    // Field codes in first-seen order; an empty batch still gets the known schema
    let mut codes: Vec<&str> = Vec::new();
    if records.is_empty() {
        codes.extend(spec.renames_for(interval).map(|(code, _)| *code));
    }
    for record in records {
        for (code, _) in record.fields() {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
    }
    codes.retain(|code| *code != date_code);

    let stamps = record_timestamps(records, date_code)?;
    let span = stamps.iter().min().copied().zip(stamps.iter().max().copied());

    let mut columns = vec![datetime_column(DATE_TIME, stamps)];
    columns.extend(codes.iter().map(|&code| raw_column(code, records, code)));
    let raw = DataFrame::new(columns)?;

    let mut projection = vec![col(DATE_TIME)];
    projection.extend(codes.iter().map(|&code| {
        let name = renames.get(code).copied().unwrap_or(code);
        if spec.is_text_column(name) {
            col(code).alias(name)
        } else {
            numeric(col(code)).alias(name)
        }
    }));

    let sorted = raw
        .lazy()
        .select(projection)
        .sort([DATE_TIME], SortMultipleOptions::default().with_maintain_order(true))
        .collect()?;
    let subset = [DATE_TIME.to_string()];
    let frame = sorted.unique_stable(Some(subset.as_slice()), UniqueKeepStrategy::First, None)?;

    match span {
        Some((first, last)) if product.resamples_hourly(interval) => {
            resample_hourly(frame, first, last)
        }
        _ => Ok(frame),
    }
}

fn floor_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts - chrono::Duration::minutes(i64::from(ts.minute()))
        - chrono::Duration::seconds(i64::from(ts.second()))
        - chrono::Duration::nanoseconds(i64::from(ts.nanosecond()))
}

/// One row per hour from the hour of `first` to the hour of `last`.
///
/// Each column takes the first non-null value inside the hour; hours
/// without any observation are kept as all-null rows. Rows are labelled
/// with the start of their hour.
fn resample_hourly(
    frame: DataFrame,
    first: NaiveDateTime,
    last: NaiveDateTime,
) -> Result<DataFrame> {
    let aggregates: Vec<Expr> = frame
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != DATE_TIME)
        .map(|name| col(name.as_str()).drop_nulls().first())
        .collect();

    let hourly = DynamicGroupOptions {
        every: Duration::parse("1h"),
        period: Duration::parse("1h"),
        offset: Duration::parse("0h"),
        ..Default::default()
    };
    let buckets = frame
        .lazy()
        .group_by_dynamic(col(DATE_TIME), Vec::<Expr>::new(), hourly)
        .agg(aggregates);

    let (first, last) = (floor_hour(first), floor_hour(last));
    let hours = (last - first).num_hours();
    let grid = DataFrame::new(vec![datetime_column(
        DATE_TIME,
        (0..=hours).map(|h| first + chrono::Duration::hours(h)),
    )])?;

    let frame = grid
        .lazy()
        .left_join(buckets, col(DATE_TIME), col(DATE_TIME))
        .sort([DATE_TIME], SortMultipleOptions::default())
        .collect()?;
    Ok(frame)
}

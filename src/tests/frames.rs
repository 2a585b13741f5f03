//! Readers that pull typed values back out of result frames.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{DataFrame, Series};

fn series<'a>(frame: &'a DataFrame, name: &str) -> &'a Series {
    frame
        .column(name)
        .unwrap_or_else(|_| panic!("frame has no {name:?} column"))
        .as_materialized_series()
}

pub(crate) fn names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}

pub(crate) fn floats(frame: &DataFrame, name: &str) -> Vec<Option<f64>> {
    series(frame, name).f64().unwrap().into_iter().collect()
}

pub(crate) fn texts(frame: &DataFrame, name: &str) -> Vec<Option<String>> {
    series(frame, name)
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

pub(crate) fn timestamps(frame: &DataFrame, name: &str) -> Vec<Option<NaiveDateTime>> {
    series(frame, name).datetime().unwrap().as_datetime_iter().collect()
}

pub(crate) fn dates(frame: &DataFrame, name: &str) -> Vec<Option<NaiveDate>> {
    series(frame, name).date().unwrap().as_date_iter().collect()
}

//! # Request Windows
//!
//! The service caps how much time one request may cover: 31 days for most
//! products, 365 days for hourly heights and high/low events. Longer ranges
//! are split here into consecutive [`Window`]s, each fetched separately.
//!
//! ## Partitioning rules
//! - A range no longer than the cap (in whole days) is a single window that
//!   keeps the caller's minute precision, so short fine-grained requests
//!   like `20150101 06:00` → `20150101 18:00` are not widened to whole days
//! - A longer range is cut into windows of exactly the cap, starting at the
//!   requested begin; the last window is clamped to the requested end
//! - Adjacent windows share their boundary instant, so the windows are
//!   contiguous and their union is exactly the requested range
//! - A range that divides evenly never produces a trailing empty window

use crate::product::Product;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::fmt;

const MINUTE_FORMAT: &str = "%Y%m%d %H:%M";
const DAY_FORMAT: &str = "%Y%m%d";

/// How a window's bounds are written into the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// `yyyyMMdd HH:mm`
    Minute,
    /// `yyyyMMdd`
    Day,
}

/// One sub-range of the requested dates, fetched in a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
    pub precision: Precision,
}

impl Window {
    /// Window with minute precision.
    pub fn new(begin: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            begin,
            end,
            precision: Precision::Minute,
        }
    }

    pub fn span(&self) -> Duration {
        self.end - self.begin
    }

    /// Value for the `begin_date` query parameter.
    pub fn begin_param(&self) -> String {
        self.begin.format(self.pattern()).to_string()
    }

    /// Value for the `end_date` query parameter.
    pub fn end_param(&self) -> String {
        self.end.format(self.pattern()).to_string()
    }

    fn pattern(&self) -> &'static str {
        match self.precision {
            Precision::Minute => MINUTE_FORMAT,
            Precision::Day => DAY_FORMAT,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.begin_param(), self.end_param())
    }
}

/// Split `[begin, end]` into the windows needed to fetch `product`.
///
/// `begin` must not be after `end`; [`crate::Request::date_range`] enforces this.
pub fn plan_windows(begin: NaiveDateTime, end: NaiveDateTime, product: Product) -> Vec<Window> {
    partition(begin, end, product.spec().max_window_days)
}

fn partition(begin: NaiveDateTime, end: NaiveDateTime, width_days: i64) -> Vec<Window> {
    if (end - begin).num_days() <= width_days {
        return vec![Window::new(begin, end)];
    }

    let width = Duration::days(width_days);
    let mut windows = Vec::new();
    let mut start = begin;
    while start < end {
        let stop = (start + width).min(end);
        windows.push(Window {
            begin: start,
            end: stop,
            precision: Precision::Day,
        });
        start = stop;
    }
    windows
}

//! # CO-OPS Data Products
//!
//! Each product the service offers differs in what it requires, how much
//! time a single request may cover, where the records live in the response
//! and what its raw field codes mean. Rather than branching on the product
//! in every component, all of that is captured once in a [`ProductSpec`]
//! descriptor, looked up with [`Product::spec`].
//!
//! | product | datum | bin | window | records |
//! |---|---|---|---|---|
//! | `water_level` | required | - | 31 d | `data` |
//! | `hourly_height` | required | - | 365 d | `data` |
//! | `high_low` | required | - | 365 d | `data` |
//! | `predictions` | optional | - | 31 d | `predictions` |
//! | `currents` | - | required | 31 d | `data` |
//! | meteorological | - | - | 31 d | `data` |

use crate::error::CoopsError;
use crate::request::Interval;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default request window for most products.
pub const SHORT_WINDOW_DAYS: i64 = 31;

/// Request window for the hourly and high/low water level products.
pub const LONG_WINDOW_DAYS: i64 = 365;

/// A data product offered by the CO-OPS data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    WaterLevel,
    HourlyHeight,
    HighLow,
    Predictions,
    Currents,
    Wind,
    AirPressure,
    AirTemperature,
    WaterTemperature,
}

/// Shape of the normalized table a product produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One row per observation, indexed by timestamp
    TimeSeries,
    /// One row per calendar day with higher-high/high/low/lower-low columns
    DailyExtrema,
}

/// Static description of how a product is requested and normalized.
#[derive(Debug)]
pub struct ProductSpec {
    pub requires_datum: bool,
    pub requires_bin: bool,
    pub max_window_days: i64,
    /// Top-level key holding the record array in the response document
    pub response_key: &'static str,
    /// Raw field code → normalized column name
    pub renames: &'static [(&'static str, &'static str)],
    /// Extra renames applied only for `interval=hilo` requests
    pub hilo_renames: &'static [(&'static str, &'static str)],
    /// Columns kept as text; every other non-timestamp column is numeric
    pub text_columns: &'static [&'static str],
    pub layout: Layout,
}

/// Name of the timestamp column every product carries.
pub const DATE_TIME: &str = "date_time";

static WATER_LEVEL: ProductSpec = ProductSpec {
    requires_datum: true,
    requires_bin: false,
    max_window_days: SHORT_WINDOW_DAYS,
    response_key: "data",
    renames: &[
        ("f", "flags"),
        ("q", "QC"),
        ("s", "sigma"),
        ("t", DATE_TIME),
        ("v", "water_level"),
    ],
    hilo_renames: &[],
    text_columns: &["flags", "QC"],
    layout: Layout::TimeSeries,
};

static HOURLY_HEIGHT: ProductSpec = ProductSpec {
    requires_datum: true,
    requires_bin: false,
    max_window_days: LONG_WINDOW_DAYS,
    response_key: "data",
    renames: &[
        ("f", "flags"),
        ("s", "sigma"),
        ("t", DATE_TIME),
        ("v", "water_level"),
    ],
    hilo_renames: &[],
    text_columns: &["flags"],
    layout: Layout::TimeSeries,
};

static HIGH_LOW: ProductSpec = ProductSpec {
    requires_datum: true,
    requires_bin: false,
    max_window_days: LONG_WINDOW_DAYS,
    response_key: "data",
    renames: &[
        ("f", "flags"),
        ("ty", "high_low"),
        ("t", DATE_TIME),
        ("v", "water_level"),
    ],
    hilo_renames: &[],
    text_columns: &["flags", "high_low"],
    layout: Layout::DailyExtrema,
};

static PREDICTIONS: ProductSpec = ProductSpec {
    requires_datum: false,
    requires_bin: false,
    max_window_days: SHORT_WINDOW_DAYS,
    response_key: "predictions",
    renames: &[("t", DATE_TIME), ("v", "predicted_wl")],
    hilo_renames: &[("type", "hi_lo")],
    text_columns: &["hi_lo"],
    layout: Layout::TimeSeries,
};

static CURRENTS: ProductSpec = ProductSpec {
    requires_datum: false,
    requires_bin: true,
    max_window_days: SHORT_WINDOW_DAYS,
    response_key: "data",
    renames: &[
        ("b", "bin"),
        ("d", "direction"),
        ("s", "speed"),
        ("t", DATE_TIME),
    ],
    hilo_renames: &[],
    text_columns: &[],
    layout: Layout::TimeSeries,
};

static WIND: ProductSpec = ProductSpec {
    requires_datum: false,
    requires_bin: false,
    max_window_days: SHORT_WINDOW_DAYS,
    response_key: "data",
    renames: &[
        ("d", "dir"),
        ("dr", "compass"),
        ("f", "flags"),
        ("g", "gust_spd"),
        ("s", "spd"),
        ("t", DATE_TIME),
    ],
    hilo_renames: &[],
    text_columns: &["flags", "compass"],
    layout: Layout::TimeSeries,
};

const fn meteorological(renames: &'static [(&'static str, &'static str)]) -> ProductSpec {
    ProductSpec {
        requires_datum: false,
        requires_bin: false,
        max_window_days: SHORT_WINDOW_DAYS,
        response_key: "data",
        renames,
        hilo_renames: &[],
        text_columns: &["flags"],
        layout: Layout::TimeSeries,
    }
}

static AIR_PRESSURE: ProductSpec =
    meteorological(&[("f", "flags"), ("t", DATE_TIME), ("v", "air_press")]);
static AIR_TEMPERATURE: ProductSpec =
    meteorological(&[("f", "flags"), ("t", DATE_TIME), ("v", "air_temp")]);
static WATER_TEMPERATURE: ProductSpec =
    meteorological(&[("f", "flags"), ("t", DATE_TIME), ("v", "water_temp")]);

impl Product {
    /// Every supported product, in documentation order.
    pub const ALL: [Product; 9] = [
        Product::WaterLevel,
        Product::HourlyHeight,
        Product::HighLow,
        Product::Predictions,
        Product::Currents,
        Product::Wind,
        Product::AirPressure,
        Product::AirTemperature,
        Product::WaterTemperature,
    ];

    /// Name used by the service's `product` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Product::WaterLevel => "water_level",
            Product::HourlyHeight => "hourly_height",
            Product::HighLow => "high_low",
            Product::Predictions => "predictions",
            Product::Currents => "currents",
            Product::Wind => "wind",
            Product::AirPressure => "air_pressure",
            Product::AirTemperature => "air_temperature",
            Product::WaterTemperature => "water_temperature",
        }
    }

    pub fn spec(self) -> &'static ProductSpec {
        match self {
            Product::WaterLevel => &WATER_LEVEL,
            Product::HourlyHeight => &HOURLY_HEIGHT,
            Product::HighLow => &HIGH_LOW,
            Product::Predictions => &PREDICTIONS,
            Product::Currents => &CURRENTS,
            Product::Wind => &WIND,
            Product::AirPressure => &AIR_PRESSURE,
            Product::AirTemperature => &AIR_TEMPERATURE,
            Product::WaterTemperature => &WATER_TEMPERATURE,
        }
    }

    /// Whether the normalized table is collapsed to one row per hour.
    ///
    /// Water levels are always resampled; currents only when hourly data was
    /// asked for.
    pub fn resamples_hourly(self, interval: Option<Interval>) -> bool {
        self == Product::WaterLevel
            || (self == Product::Currents && interval == Some(Interval::Hourly))
    }
}

impl ProductSpec {
    /// Renames in effect for a request with the given interval.
    pub fn renames_for(
        &self,
        interval: Option<Interval>,
    ) -> impl Iterator<Item = &'static (&'static str, &'static str)> {
        let hilo: &'static [(&'static str, &'static str)] = if interval == Some(Interval::HiLo) {
            self.hilo_renames
        } else {
            &[]
        };
        self.renames.iter().chain(hilo.iter())
    }

    pub fn is_text_column(&self, name: &str) -> bool {
        self.text_columns.contains(&name)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = CoopsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| CoopsError::UnsupportedProduct {
                name: s.to_string(),
            })
    }
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

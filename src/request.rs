//! # Request Parameters
//!
//! A [`Request`] describes one call to [`crate::get_data`]: which station,
//! which product, which date range and the product-specific extras (datum,
//! current bin, interval). Dates stay as the caller wrote them until the
//! chunked fetcher parses them with [`parse_known_date_formats`], so a bad
//! date surfaces as [`CoopsError::InvalidDateFormat`] at fetch time, before
//! any request is sent.

use crate::error::{CoopsError, Result};
use crate::product::Product;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date formats accepted by the service, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y%m%d", "%m/%d/%Y"];
const DATE_TIME_FORMATS: [&str; 2] = ["%Y%m%d %H:%M", "%m/%d/%Y %H:%M"];

/// Unit system for returned values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    English,
}

/// Time zone the service reports timestamps in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeZone {
    /// Greenwich Mean Time
    #[default]
    Gmt,
    /// Local standard time at the station
    Lst,
    /// Local standard/daylight time at the station
    LstLdt,
}

/// Sampling interval override.
///
/// Without one the service returns its default granularity (6-minute data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    /// Hourly values (`h`)
    Hourly,
    /// High and low tide events only (`hilo`)
    HiLo,
    /// Fixed minute spacing, e.g. `6`, `30` or `60`
    Minutes(u32),
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::English => "english",
        }
    }
}

impl TimeZone {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeZone::Gmt => "gmt",
            TimeZone::Lst => "lst",
            TimeZone::LstLdt => "lst_ldt",
        }
    }
}

impl Interval {
    /// Value sent as the `interval` query parameter.
    pub fn to_param(self) -> String {
        match self {
            Interval::Hourly => "h".to_string(),
            Interval::HiLo => "hilo".to_string(),
            Interval::Minutes(m) => m.to_string(),
        }
    }
}

impl FromStr for Units {
    type Err = CoopsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "english" => Ok(Units::English),
            _ => Err(CoopsError::InvalidParameter {
                name: "units",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for TimeZone {
    type Err = CoopsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmt" => Ok(TimeZone::Gmt),
            "lst" => Ok(TimeZone::Lst),
            "lst_ldt" => Ok(TimeZone::LstLdt),
            _ => Err(CoopsError::InvalidParameter {
                name: "time_zone",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Interval {
    type Err = CoopsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "h" => Ok(Interval::Hourly),
            "hilo" => Ok(Interval::HiLo),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|m| *m > 0)
                .map(Interval::Minutes)
                .ok_or_else(|| CoopsError::InvalidParameter {
                    name: "interval",
                    value: s.to_string(),
                }),
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param())
    }
}

/// Parameters of a single data retrieval.
///
/// # Example
/// ```
/// use coops_lib::{Product, Request, Units};
///
/// let request = Request::new("20150101", "20150331", "9442396", Product::WaterLevel)
///     .datum("MLLW")
///     .units(Units::English);
///
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub begin_date: String,
    pub end_date: String,
    pub station: String,
    pub product: Product,
    pub datum: Option<String>,
    pub bin: Option<u32>,
    pub interval: Option<Interval>,
    pub units: Units,
    pub time_zone: TimeZone,
}

impl Request {
    /// Start a request with metric units in GMT and no optional parameters.
    pub fn new(
        begin_date: impl Into<String>,
        end_date: impl Into<String>,
        station: impl Into<String>,
        product: Product,
    ) -> Self {
        Self {
            begin_date: begin_date.into(),
            end_date: end_date.into(),
            station: station.into(),
            product,
            datum: None,
            bin: None,
            interval: None,
            units: Units::default(),
            time_zone: TimeZone::default(),
        }
    }

    pub fn datum(mut self, datum: impl Into<String>) -> Self {
        self.datum = Some(datum.into());
        self
    }

    pub fn bin(mut self, bin: u32) -> Self {
        self.bin = Some(bin);
        self
    }

    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Check product-specific required parameters.
    pub fn validate(&self) -> Result<()> {
        let spec = self.product.spec();
        if spec.requires_datum && self.datum.is_none() {
            return Err(CoopsError::MissingParameter {
                product: self.product,
                parameter: "datum",
            });
        }
        if spec.requires_bin && self.bin.is_none() {
            return Err(CoopsError::MissingParameter {
                product: self.product,
                parameter: "bin",
            });
        }
        Ok(())
    }

    /// Parse begin and end dates, rejecting a range that runs backwards.
    pub fn date_range(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let begin = parse_known_date_formats(&self.begin_date)?;
        let end = parse_known_date_formats(&self.end_date)?;
        if end < begin {
            return Err(CoopsError::InvalidDateRange { begin, end });
        }
        Ok((begin, end))
    }
}

/// Parse a date in any of the formats the service accepts.
///
/// Accepted: `yyyyMMdd`, `yyyyMMdd HH:mm`, `MM/dd/yyyy`, `MM/dd/yyyy HH:mm`.
/// Date-only input resolves to midnight.
pub fn parse_known_date_formats(input: &str) -> Result<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| CoopsError::InvalidDateFormat {
            input: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_all_accepted_formats() {
        assert_eq!(parse_known_date_formats("20150101").unwrap(), ymd_hm(2015, 1, 1, 0, 0));
        assert_eq!(
            parse_known_date_formats("20150101 13:45").unwrap(),
            ymd_hm(2015, 1, 1, 13, 45)
        );
        assert_eq!(parse_known_date_formats("03/31/2015").unwrap(), ymd_hm(2015, 3, 31, 0, 0));
        assert_eq!(
            parse_known_date_formats("03/31/2015 06:30").unwrap(),
            ymd_hm(2015, 3, 31, 6, 30)
        );
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        for bad in ["2015/01/01", "2015-01-01", "", "yesterday", "20151301"] {
            let err = parse_known_date_formats(bad).unwrap_err();
            assert!(
                matches!(err, CoopsError::InvalidDateFormat { .. }),
                "{bad:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_surrounding_whitespace() {
        for padded in [" 20150101 ", "20150101 ", "03/31/2015 ", "20150101 13:45 "] {
            assert!(
                matches!(
                    parse_known_date_formats(padded),
                    Err(CoopsError::InvalidDateFormat { .. })
                ),
                "{padded:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_requires_datum() {
        for product in [Product::WaterLevel, Product::HourlyHeight, Product::HighLow] {
            let err = Request::new("20150101", "20150102", "9442396", product)
                .validate()
                .unwrap_err();
            assert!(matches!(
                err,
                CoopsError::MissingParameter { parameter: "datum", .. }
            ));
        }
    }

    #[test]
    fn test_validate_requires_bin_for_currents() {
        let request = Request::new("20150101", "20150102", "PUG1515", Product::Currents);
        let err = request.clone().validate().unwrap_err();
        assert!(matches!(
            err,
            CoopsError::MissingParameter { product: Product::Currents, parameter: "bin" }
        ));
        assert!(request.bin(1).validate().is_ok());
    }

    #[test]
    fn test_validate_optional_parameters() {
        assert!(Request::new("20150101", "20150102", "9442396", Product::Predictions)
            .validate()
            .is_ok());
        assert!(Request::new("20150101", "20150102", "9442396", Product::Wind)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_date_range_rejects_backwards_range() {
        let request = Request::new("20150301", "20150101", "9442396", Product::Wind);
        assert!(matches!(
            request.date_range().unwrap_err(),
            CoopsError::InvalidDateRange { .. }
        ));
    }

    #[test]
    fn test_parameter_text_parsing() {
        assert_eq!("english".parse::<Units>().unwrap(), Units::English);
        assert_eq!("LST_LDT".parse::<TimeZone>().unwrap(), TimeZone::LstLdt);
        assert_eq!("h".parse::<Interval>().unwrap(), Interval::Hourly);
        assert_eq!("hilo".parse::<Interval>().unwrap(), Interval::HiLo);
        assert_eq!("6".parse::<Interval>().unwrap(), Interval::Minutes(6));
        assert!("0".parse::<Interval>().is_err());
        assert!("imperial".parse::<Units>().is_err());
    }
}

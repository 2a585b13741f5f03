//! # Query URL Construction
//!
//! Turns a [`Request`] and one [`Window`] into the `datagetter` URL for that
//! window. This is a pure function of its inputs: nothing here touches the
//! network, which keeps parameter validation testable and guarantees a
//! request with a missing datum or bin fails before anything is sent.
//!
//! ## Parameters
//! Names are the service's fixed contract and must match exactly:
//! `begin_date`, `end_date`, `station`, `product`, `datum`, `bin`,
//! `interval`, `units`, `time_zone`, `application`, `format`.
//! Optional parameters are omitted entirely when not set.

use crate::config::ServiceConfig;
use crate::error::{CoopsError, Result};
use crate::request::Request;
use crate::window::Window;
use reqwest::Url;

/// Production data API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

/// Identifier the service uses to attribute traffic.
pub const DEFAULT_APPLICATION: &str = "coops_fetch";

/// Builds per-window request URLs against a configurable endpoint.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: String,
    application: String,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_APPLICATION)
    }
}

impl QueryBuilder {
    pub fn new(base_url: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            application: application.into(),
        }
    }

    pub fn from_config(service: &ServiceConfig) -> Self {
        Self::new(&service.base_url, &service.application)
    }

    /// Build the URL fetching `window` of `request`.
    ///
    /// Fails with [`CoopsError::MissingParameter`] when the product needs a
    /// datum or current bin the request does not carry.
    pub fn build(&self, request: &Request, window: &Window) -> Result<Url> {
        request.validate()?;

        let mut params: Vec<(&str, String)> = vec![
            ("begin_date", window.begin_param()),
            ("end_date", window.end_param()),
            ("station", request.station.clone()),
            ("product", request.product.as_str().to_string()),
        ];
        if let Some(datum) = &request.datum {
            params.push(("datum", datum.clone()));
        }
        if let Some(bin) = request.bin {
            params.push(("bin", bin.to_string()));
        }
        if let Some(interval) = request.interval {
            params.push(("interval", interval.to_param()));
        }
        params.push(("units", request.units.as_str().to_string()));
        params.push(("time_zone", request.time_zone.as_str().to_string()));
        params.push(("application", self.application.clone()));
        params.push(("format", "json".to_string()));

        Url::parse_with_params(&self.base_url, &params).map_err(|_| {
            CoopsError::InvalidParameter {
                name: "base_url",
                value: self.base_url.clone(),
            }
        })
    }
}

/// Build a query URL against the production endpoint.
pub fn build_query_url(request: &Request, window: &Window) -> Result<String> {
    QueryBuilder::default()
        .build(request, window)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Product;
    use crate::request::{Interval, TimeZone, Units};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn window() -> Window {
        let begin = NaiveDate::from_ymd_opt(2015, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2015, 1, 2)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        Window::new(begin, end)
    }

    fn params(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_water_level_query_parameters() {
        let request = Request::new("20150101", "20150102", "9442396", Product::WaterLevel)
            .datum("MLLW")
            .units(Units::English)
            .time_zone(TimeZone::Lst);
        let url = build_query_url(&request, &window()).unwrap();
        assert!(url.starts_with(DEFAULT_BASE_URL));

        let p = params(&url);
        assert_eq!(p["begin_date"], "20150101 00:00");
        assert_eq!(p["end_date"], "20150102 12:30");
        assert_eq!(p["station"], "9442396");
        assert_eq!(p["product"], "water_level");
        assert_eq!(p["datum"], "MLLW");
        assert_eq!(p["units"], "english");
        assert_eq!(p["time_zone"], "lst");
        assert_eq!(p["application"], DEFAULT_APPLICATION);
        assert_eq!(p["format"], "json");
        assert!(!p.contains_key("bin"));
        assert!(!p.contains_key("interval"));
    }

    #[test]
    fn test_interval_only_when_requested() {
        let base = Request::new("20150101", "20150102", "9442396", Product::Predictions);
        let without = params(&build_query_url(&base, &window()).unwrap());
        assert!(!without.contains_key("interval"));
        assert!(!without.contains_key("datum"));

        let with = params(&build_query_url(&base.interval(Interval::HiLo), &window()).unwrap());
        assert_eq!(with["interval"], "hilo");
    }

    #[test]
    fn test_currents_sends_bin() {
        let request = Request::new("20150101", "20150102", "PUG1515", Product::Currents).bin(3);
        let p = params(&build_query_url(&request, &window()).unwrap());
        assert_eq!(p["bin"], "3");
    }

    #[test]
    fn test_missing_datum_is_rejected() {
        let request = Request::new("20150101", "20150102", "9442396", Product::HighLow);
        let err = build_query_url(&request, &window()).unwrap_err();
        assert!(matches!(
            err,
            CoopsError::MissingParameter { product: Product::HighLow, parameter: "datum" }
        ));
    }

    #[test]
    fn test_custom_endpoint_and_application() {
        let builder = QueryBuilder::new("http://localhost:8080/api/datagetter", "harbor_study");
        let request = Request::new("20150101", "20150102", "9442396", Product::Wind);
        let url = builder.build(&request, &window()).unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(params(url.as_str())["application"], "harbor_study");
    }

    #[test]
    fn test_bad_base_url() {
        let builder = QueryBuilder::new("not a url", DEFAULT_APPLICATION);
        let request = Request::new("20150101", "20150102", "9442396", Product::Wind);
        assert!(matches!(
            builder.build(&request, &window()).unwrap_err(),
            CoopsError::InvalidParameter { name: "base_url", .. }
        ));
    }
}

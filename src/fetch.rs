//! # Raw Fetching
//!
//! The chunked fetcher only needs one capability from the outside world:
//! "fetch this URL and give me the parsed JSON document". That capability is
//! the [`RawFetch`] trait. [`HttpFetcher`] implements it over a blocking
//! `reqwest` client; tests and callers with their own transport can supply
//! any other implementation.
//!
//! ## Response handling
//! Once a document is in hand, [`extract_records`] applies the service's
//! conventions:
//! - A top-level `"error"` object means the service rejected the request;
//!   its `"message"` is surfaced verbatim as [`CoopsError::Remote`]
//! - Records live under `"predictions"` for tide predictions and under
//!   `"data"` for everything else
//! - Every record is flattened to field code → text; numbers are
//!   stringified and `null`s dropped, leaving typing to the normalizer
//!
//! ## Error Handling
//! - **Transport**: connection, TLS, timeout and non-2xx responses
//! - **ResponseParse**: a body that is not JSON or lacks the record array
//!
//! Neither is retried here; a retry policy belongs to the transport.

use crate::config::ServiceConfig;
use crate::error::{CoopsError, Result};
use crate::product::Product;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Message used when the service reports an error without one.
pub const DEFAULT_ERROR_MESSAGE: &str = "Error retrieving data";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// One observation exactly as the service returned it: field code → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, String>);

impl RawRecord {
    /// Value of a raw field code such as `"t"` or `"v"`.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Fields in code order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flatten a JSON object into a record; `None` for non-objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let fields = object
            .iter()
            .filter_map(|(code, v)| {
                let text = match v {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => other.to_string(),
                };
                Some((code.clone(), text))
            })
            .collect();
        Some(Self(fields))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Fetch a URL and return its body as parsed JSON.
///
/// Implementations report network failures as [`CoopsError::Transport`] and
/// undecodable bodies as [`CoopsError::ResponseParse`].
pub trait RawFetch {
    fn fetch(&self, url: &str) -> Result<Value>;
}

impl<F: RawFetch + ?Sized> RawFetch for &F {
    fn fetch(&self, url: &str) -> Result<Value> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP implementation of [`RawFetch`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Client with a bounded per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(service: &ServiceConfig) -> Result<Self> {
        Self::new(Duration::from_secs(service.timeout_secs))
    }
}

impl RawFetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Value> {
        debug!(url, "requesting");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        let body = response.text()?;
        let document = serde_json::from_str::<Value>(&body);

        if !status.is_success() {
            // An error document explains the failure better than the status does
            return match document {
                Ok(doc) if doc.get("error").is_some() => Ok(doc),
                _ => Err(CoopsError::transport(format!("HTTP {status}"))),
            };
        }

        document.map_err(|e| CoopsError::response_parse(format!("body is not JSON: {e}")))
    }
}

/// Pull the record array for `product` out of a response document.
pub fn extract_records(document: &Value, product: Product) -> Result<Vec<RawRecord>> {
    if let Some(error) = document.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .unwrap_or(DEFAULT_ERROR_MESSAGE);
        return Err(CoopsError::remote(message));
    }

    let key = product.spec().response_key;
    let items = document
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| CoopsError::response_parse(format!("response has no {key:?} array")))?;

    items
        .iter()
        .map(|item| {
            RawRecord::from_json(item).ok_or_else(|| {
                CoopsError::response_parse(format!("{key:?} entry is not an object: {item}"))
            })
        })
        .collect()
}

/// Fetch one URL and extract its records.
pub fn fetch_records<F: RawFetch + ?Sized>(
    fetcher: &F,
    url: &str,
    product: Product,
) -> Result<Vec<RawRecord>> {
    let document = fetcher.fetch(url)?;
    extract_records(&document, product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_data_array() {
        let doc = json!({
            "metadata": {"id": "9442396", "name": "La Push"},
            "data": [
                {"t": "2015-01-01 00:00", "v": "1.234", "s": "0.003", "f": "0,0,0,0", "q": "v"},
                {"t": "2015-01-01 00:06", "v": "1.301", "s": "0.004", "f": "0,0,0,0", "q": "v"}
            ]
        });
        let records = extract_records(&doc, Product::WaterLevel).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("v"), Some("1.301"));
        assert_eq!(records[0].get("q"), Some("v"));
    }

    #[test]
    fn test_predictions_use_their_own_key() {
        let doc = json!({"predictions": [{"t": "2015-01-01 00:00", "v": "0.5"}]});
        assert_eq!(extract_records(&doc, Product::Predictions).unwrap().len(), 1);
        assert!(matches!(
            extract_records(&doc, Product::WaterLevel).unwrap_err(),
            CoopsError::ResponseParse { .. }
        ));
    }

    #[test]
    fn test_service_error_message_is_verbatim() {
        let doc = json!({"error": {"message": "No data was found. This product may not be offered at this station at the requested time."}});
        let err = extract_records(&doc, Product::WaterLevel).unwrap_err();
        match err {
            CoopsError::Remote { message, window } => {
                assert!(message.starts_with("No data was found."));
                assert!(window.is_none());
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_service_error_without_message() {
        let doc = json!({"error": {}});
        match extract_records(&doc, Product::Wind).unwrap_err() {
            CoopsError::Remote { message, .. } => assert_eq!(message, DEFAULT_ERROR_MESSAGE),
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_record_flattening() {
        let record = RawRecord::from_json(&json!({"t": "2015-01-01 00:00", "v": 1.5, "s": null, "b": 3}))
            .unwrap();
        assert_eq!(record.get("v"), Some("1.5"));
        assert_eq!(record.get("b"), Some("3"));
        assert_eq!(record.get("s"), None);
        assert_eq!(record.fields().count(), 3);
        assert!(RawRecord::from_json(&json!("oops")).is_none());
    }

    #[test]
    fn test_non_object_entry_is_parse_error() {
        let doc = json!({"data": [1, 2]});
        assert!(matches!(
            extract_records(&doc, Product::Wind).unwrap_err(),
            CoopsError::ResponseParse { .. }
        ));
    }
}

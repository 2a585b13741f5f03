//! # Error Taxonomy
//!
//! Every failure in the request/fetch/normalize pipeline is a [`CoopsError`].
//! The pipeline is fail-fast: the first error aborts a multi-window fetch and
//! is returned to the caller as-is, with the failing window attached when the
//! failure happened while talking to the service.
//!
//! Errors fall into four coarse [`ErrorKind`]s so callers can decide what to
//! do without matching every variant:
//! - **InvalidRequest**: the caller asked for something malformed; no request was sent
//! - **ServiceRejected**: the service answered with an `"error"` payload
//! - **Transport**: the HTTP exchange itself failed
//! - **InvalidResponse**: the service answered, but not in the expected shape
//!   (or its records could not be shaped into a frame)

use crate::product::Product;
use crate::window::Window;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoopsError>;

/// Coarse classification of a [`CoopsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    ServiceRejected,
    Transport,
    InvalidResponse,
}

/// Errors that can occur while building, fetching or normalizing CO-OPS data.
#[derive(Error, Debug)]
pub enum CoopsError {
    /// Begin or end date matched none of the accepted formats
    #[error(
        "no valid date format found for {input:?} \
         (expected yyyyMMdd, yyyyMMdd HH:mm, MM/dd/yyyy or MM/dd/yyyy HH:mm)"
    )]
    InvalidDateFormat { input: String },

    /// End date lies before the begin date
    #[error("end date {end} is before begin date {begin}")]
    InvalidDateRange {
        begin: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// A product-specific parameter (datum, bin) was not supplied
    #[error("no {parameter} specified for {product} data")]
    MissingParameter {
        product: Product,
        parameter: &'static str,
    },

    /// Units, time zone or interval text is not one the service accepts
    #[error("invalid {name}: {value:?}")]
    InvalidParameter { name: &'static str, value: String },

    /// Product name is not one this crate knows how to request and normalize
    #[error("unsupported product: {name:?}")]
    UnsupportedProduct { name: String },

    /// The service returned an `"error"` document
    #[error("service rejected request{}: {message}", window_suffix(.window))]
    Remote {
        message: String,
        window: Option<Window>,
    },

    /// Network, TLS, timeout or non-2xx HTTP failure
    #[error("transport error{}: {message}", window_suffix(.window))]
    Transport {
        message: String,
        window: Option<Window>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Body was not JSON, lacked the record array, or held an unreadable timestamp
    #[error("unexpected response{}: {message}", window_suffix(.window))]
    ResponseParse {
        message: String,
        window: Option<Window>,
    },

    /// Building or reshaping the result frame failed
    #[error("frame error: {0}")]
    Frame(#[from] polars::error::PolarsError),
}

fn window_suffix(window: &Option<Window>) -> String {
    match window {
        Some(w) => format!(" for window {w}"),
        None => String::new(),
    }
}

impl CoopsError {
    /// Create a service-rejected error from the service's message
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            window: None,
        }
    }

    /// Create a transport error without an underlying `reqwest` error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            window: None,
            source: None,
        }
    }

    /// Create a response-shape error
    pub fn response_parse(message: impl Into<String>) -> Self {
        Self::ResponseParse {
            message: message.into(),
            window: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDateFormat { .. }
            | Self::InvalidDateRange { .. }
            | Self::MissingParameter { .. }
            | Self::InvalidParameter { .. }
            | Self::UnsupportedProduct { .. } => ErrorKind::InvalidRequest,
            Self::Remote { .. } => ErrorKind::ServiceRejected,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::ResponseParse { .. } | Self::Frame(_) => ErrorKind::InvalidResponse,
        }
    }

    /// The window being fetched when this error occurred, if any.
    pub fn window(&self) -> Option<&Window> {
        match self {
            Self::Remote { window, .. }
            | Self::Transport { window, .. }
            | Self::ResponseParse { window, .. } => window.as_ref(),
            _ => None,
        }
    }

    /// Attach the failing window to a service-side error.
    ///
    /// Request-side errors are returned unchanged, as is an error that
    /// already names a window.
    pub fn in_window(mut self, failing: &Window) -> Self {
        if let Self::Remote { window, .. }
        | Self::Transport { window, .. }
        | Self::ResponseParse { window, .. } = &mut self
        {
            if window.is_none() {
                *window = Some(*failing);
            }
        }
        self
    }
}

impl From<reqwest::Error> for CoopsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::response_parse(err.to_string());
        }
        Self::Transport {
            message: err.to_string(),
            window: None,
            source: Some(err),
        }
    }
}

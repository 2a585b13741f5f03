//! # Chunked CO-OPS Data Fetching
//!
//! This module drives a complete request against the CO-OPS `datagetter`
//! service: it plans the request's date windows, fetches each window in turn
//! and hands the concatenated records to the normalizer.
//!
//! ## Data Source
//!
//! ### NOAA CO-OPS Data API
//! - **URL**: https://api.tidesandcurrents.noaa.gov/api/prod/datagetter
//! - **Format**: JSON, one document per window
//! - **Limits**: 31 days per call for 6-minute products, 365 days for
//!   `hourly_height` and `high_low`
//!
//! ### Data Processing Pipeline
//! 1. **Validate**: product-specific parameters (datum, bin) are checked
//!    before anything is sent
//! 2. **Plan**: begin/end are parsed and split into windows the service accepts
//! 3. **Fetch**: one GET per window, sequentially, in window order
//! 4. **Concatenate**: batches are joined once all windows succeeded
//! 5. **Normalize**: records become a typed Polars `DataFrame`
//!
//! ## Error Handling
//!
//! Fetching is fail-fast. The first failing window aborts the whole call and
//! no partial table is returned. Service, transport and parse failures carry
//! the window they happened in, so a caller retrying a long range can see
//! where it broke.

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{fetch_records, HttpFetcher, RawFetch, RawRecord};
use crate::normalize::normalize;
use crate::query::QueryBuilder;
use crate::request::Request;
use crate::window::{plan_windows, Window};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info};

/// Records returned for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    pub window: Window,
    pub records: Vec<RawRecord>,
}

/// Fetches requests window by window through a [`RawFetch`] implementation.
#[derive(Debug, Clone)]
pub struct ChunkedFetcher<F> {
    fetcher: F,
    query: QueryBuilder,
}

impl<F: RawFetch> ChunkedFetcher<F> {
    /// Fetcher targeting the production endpoint.
    pub fn new(fetcher: F) -> Self {
        Self::with_query_builder(fetcher, QueryBuilder::default())
    }

    pub fn with_query_builder(fetcher: F, query: QueryBuilder) -> Self {
        Self { fetcher, query }
    }

    /// Fetch every window of `request`, returning one batch per window in
    /// window order.
    pub fn fetch_batches(&self, request: &Request) -> Result<Vec<Batch>> {
        request.validate()?;
        let (begin, end) = request.date_range()?;
        let windows = plan_windows(begin, end, request.product);
        debug!(
            product = request.product.as_str(),
            station = %request.station,
            windows = windows.len(),
            "planned request"
        );

        let mut batches = Vec::with_capacity(windows.len());
        for window in windows {
            let url = self.query.build(request, &window)?;
            debug!(%window, %url, "fetching window");
            let records = fetch_records(&self.fetcher, url.as_str(), request.product)
                .map_err(|e| e.in_window(&window))?;
            batches.push(Batch { window, records });
        }

        info!(
            product = request.product.as_str(),
            station = %request.station,
            windows = batches.len(),
            records = batches.iter().map(|b| b.records.len()).sum::<usize>(),
            "fetched"
        );
        Ok(batches)
    }

    /// Fetch and normalize `request` into a single frame.
    pub fn get_data(&self, request: &Request) -> Result<DataFrame> {
        let batches = self.fetch_batches(request)?;
        let records: Vec<RawRecord> = batches.into_iter().flat_map(|b| b.records).collect();
        normalize(&records, request.product, request.interval)
    }
}

impl ChunkedFetcher<HttpFetcher> {
    /// HTTP fetcher configured from the `[service]` section.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_query_builder(
            HttpFetcher::from_config(&config.service)?,
            QueryBuilder::from_config(&config.service),
        ))
    }
}

/// Fetch the raw batches of `request` through `fetcher`.
pub fn fetch_batches<F: RawFetch>(request: &Request, fetcher: F) -> Result<Vec<Batch>> {
    ChunkedFetcher::new(fetcher).fetch_batches(request)
}

/// Fetch `request` through `fetcher` and normalize the result.
pub fn get_data<F: RawFetch>(request: &Request, fetcher: F) -> Result<DataFrame> {
    ChunkedFetcher::new(fetcher).get_data(request)
}

/// Fetch `request` over HTTP using coops-config.toml (or defaults).
pub fn fetch(request: &Request) -> Result<DataFrame> {
    ChunkedFetcher::from_config(&Config::load())?.get_data(request)
}

//! # CO-OPS Data Library
//!
//! This library retrieves oceanographic and meteorological time series
//! (water levels, tide predictions, currents, wind, air and water
//! temperature) from the NOAA CO-OPS data service and normalizes them into
//! typed in-memory tables.
//!
//! ## Design Philosophy
//!
//! ### Service Limits Are Handled Here
//! The service caps how many days one call may cover: 31 days for 6-minute
//! products and 365 days for `hourly_height` and `high_low`. A [`Request`]
//! may span any range; it is split into [`Window`]s, fetched one window at a
//! time and concatenated in chronological order.
//!
//! ### Transport Is a Collaborator
//! All network access goes through the [`RawFetch`] trait ("fetch this URL,
//! give me JSON"). [`HttpFetcher`] is the blocking `reqwest` implementation;
//! anything else, such as a recorded fixture, plugs in the same way.
//!
//! ### One Frame Per Call
//! Calls are synchronous and stateless. Each returns a single Polars
//! `DataFrame` with stable column names, or the first error encountered.
//! The leading `date_time` column is the sorted row index.
//!
//! ### Data Flow
//! 1. **Plan**: begin/end dates → windows ([`plan_windows`])
//! 2. **Query**: request + window → URL ([`QueryBuilder`])
//! 3. **Fetch**: URL → raw records, per window ([`ChunkedFetcher`])
//! 4. **Normalize**: records → typed frame ([`normalize`])
//!
//! ## Example
//! ```no_run
//! use coops_lib::{get_data, HttpFetcher, Product, Request};
//! use std::time::Duration;
//!
//! # fn main() -> coops_lib::Result<()> {
//! let request = Request::new("20150101", "20150331", "9442396", Product::WaterLevel)
//!     .datum("MLLW");
//! let frame = get_data(&request, HttpFetcher::new(Duration::from_secs(60))?)?;
//!
//! println!("{} hourly rows", frame.height());
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod extrema;
pub mod fetch;
pub mod normalize;
pub mod product;
pub mod query;
pub mod request;
pub mod tide_data;
pub mod window;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{CoopsError, ErrorKind, Result};
pub use fetch::{HttpFetcher, RawFetch, RawRecord};
pub use normalize::normalize;
pub use product::{Product, ProductSpec};
pub use query::{build_query_url, QueryBuilder};
pub use request::{Interval, Request, TimeZone, Units};
pub use tide_data::{fetch_batches, get_data, Batch, ChunkedFetcher};
pub use window::{plan_windows, Window};

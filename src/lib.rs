//! A small Rust client for the Yandex.Metrica reporting API that is compatible
//! with the Google Analytics Core Reporting API (v3).
//!
//! This crate implements a report flow:
//! describe a query, request it page by page, then consume the rows as
//! records or save them to a CSV file.
//!
//! ## Quick start
//! - Configure authentication via environment variables (`METRIKA_TOKEN`,
//!   optionally `METRIKA_URL`) or a `.metrikarc` file (supported in the current
//!   directory and in your home directory).
//! - Build a [`ReportQuery`] and iterate [`Client::rows`].
//!
//! ```no_run
//! use anyhow::Result;
//! use metrika_reporting_ga::{Client, ReportQuery, DEFAULT_ROWS_PER_REQUEST};
//!
//! fn main() -> Result<()> {
//!     let query = ReportQuery::new()
//!         .with_counter_id("12345")
//!         .with_metrics(["ga:visits", "ga:pageviews"])
//!         .with_dimensions("ga:pagePath")
//!         .with_start_date(7u32)
//!         .with_sort("-ga:visits");
//!     let client = Client::from_env()?.with_query(query);
//!
//!     for row in client.rows(DEFAULT_ROWS_PER_REQUEST) {
//!         let row = row?;
//!         println!("{:?} {:?}", row.get("ga:pagePath"), row.get("ga:visits"));
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod export;
mod pager;
mod query;
mod report;
mod transport;

pub use client::{Client, ClientConfig, DEFAULT_ROWS_PER_REQUEST, REQUEST_URL};
pub use error::{ReportingError, Result};
pub use export::CsvOptions;
pub use pager::RowPager;
pub use query::{
    COUNTER_ID_PREFIX, DateSpec, IntoNames, ReportQuery, SamplingLevel, normalize_counter_id,
};
pub use report::{ColumnHeader, Report, Row};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

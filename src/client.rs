use anyhow::Context;
use reqwest::header::{ACCEPT_ENCODING, AUTHORIZATION, HeaderMap, HeaderValue};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::load_config;
use crate::error::{ReportingError, Result, api_error};
use crate::pager::RowPager;
use crate::query::ReportQuery;
use crate::report::{Report, Row};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};

/// Report API address.
pub const REQUEST_URL: &str = "https://api-metrika.yandex.net/analytics/v3/data/ga";

/// Page size used by [`Client::rows`] callers that have no preference.
pub const DEFAULT_ROWS_PER_REQUEST: u32 = 1000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Report endpoint, typically [`REQUEST_URL`].
    pub url: String,
    /// OAuth token sent as `Authorization: OAuth <token>`.
    pub token: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Reporting API client.
///
/// Holds the endpoint, the credentials and the [`ReportQuery`] to run.
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct Client {
    url: String,
    authorization: HeaderValue,
    query: ReportQuery,
    progress: bool,

    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url)
            .field("authorization", &"OAuth <redacted>")
            .field("query", &self.query)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client using environment variables and/or `.metrikarc`.
    ///
    /// This is equivalent to `Client::new(None, None, None)`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`token` arguments
    /// - environment variables `METRIKA_URL` / `METRIKA_TOKEN`
    /// - config file from `METRIKA_RC` or `.metrikarc`
    pub fn new(
        url: Option<String>,
        token: Option<String>,
        verify: Option<bool>,
    ) -> anyhow::Result<Self> {
        let cfg = load_config(url, token, verify)?;
        let transport = ReqwestTransport::new(cfg.verify).context("failed to build HTTP client")?;

        Ok(Self::with_transport(&cfg.token, transport)?.with_url(cfg.url))
    }

    /// Creates a client that sends requests through `transport`.
    pub fn with_transport(token: &str, transport: impl HttpTransport + 'static) -> Result<Self> {
        let authorization = HeaderValue::from_str(&format!("OAuth {}", token.trim()))
            .map_err(|_| ReportingError::Config("token contains invalid characters".into()))?;

        Ok(Self {
            url: REQUEST_URL.to_string(),
            authorization,
            query: ReportQuery::default(),
            progress: true,
            transport: Arc::new(transport),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_query(mut self, query: ReportQuery) -> Self {
        self.query = query;
        self
    }

    /// Shows a progress bar during [`Client::save_to_csv`].
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn query(&self) -> &ReportQuery {
        &self.query
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn progress(&self) -> bool {
        self.progress
    }

    /// Builds the request for rows `start..start + count` (1-based).
    pub fn build_request_params(&self, start: u64, count: u32) -> HttpRequest {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.authorization.clone());
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));

        HttpRequest {
            url: self.url.clone(),
            query: self.query.to_params(start, count),
            headers,
        }
    }

    /// Requests one page of the report.
    ///
    /// `start` is the 1-based index of the first row (`start-index`),
    /// `count` the page size (`max-results`).
    pub fn request(&self, start: u64, count: u32) -> Result<Report> {
        self.query.validate()?;

        let request = self.build_request_params(start, count);
        debug!(
            ids = self.query.counter_id().unwrap_or_default(),
            start, count, "requesting report page"
        );

        let response = self.transport.get(&request)?;
        let status = response.status();
        if status.is_client_error() {
            return Err(api_error(response));
        }
        if !status.is_success() {
            return Err(ReportingError::Status {
                status,
                response: Box::new(response),
            });
        }

        let report = Report::from_slice(response.body())?;
        debug!(
            rows = report.rows_count(),
            total = report.all_rows_count(),
            "received report page"
        );
        Ok(report)
    }

    /// First row of the report, for single-row queries such as totals.
    pub fn row(&self) -> Result<Row> {
        self.request(1, 1)?
            .into_rows()
            .next()
            .ok_or(ReportingError::EmptyReport)
    }

    /// All rows of the report, fetched `rows_per_request` at a time as the
    /// iterator is consumed.
    pub fn rows(&self, rows_per_request: u32) -> RowPager<'_> {
        RowPager::new(self, rows_per_request)
    }

    /// Like [`Client::rows`], passing every fetched page to `handler` before
    /// its rows are yielded.
    pub fn rows_with_handler<'a, F>(&'a self, rows_per_request: u32, handler: F) -> RowPager<'a>
    where
        F: FnMut(&Report) + 'a,
    {
        RowPager::new(self, rows_per_request).with_handler(handler)
    }

    /// Total rows in the report.
    pub fn all_rows_count(&self) -> Result<u64> {
        Ok(self.request(1, 1)?.all_rows_count())
    }
}

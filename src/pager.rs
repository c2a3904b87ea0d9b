use std::fmt;
use std::vec;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::{ReportingError, Result};
use crate::report::{Report, Row};

type PageHandler<'a> = Box<dyn FnMut(&Report) + 'a>;

/// Paginates over every row of a report.
///
/// Pages are requested one at a time: the next request is only sent once
/// the rows of the current page have been consumed. Iteration stops after
/// the first error.
pub struct RowPager<'a> {
    client: &'a Client,
    rows_per_request: u32,
    handler: Option<PageHandler<'a>>,

    rows_retrieved: u64,
    total_rows: Option<u64>,
    buffered: vec::IntoIter<Row>,
    finished: bool,
}

impl<'a> RowPager<'a> {
    pub(crate) fn new(client: &'a Client, rows_per_request: u32) -> Self {
        Self {
            client,
            rows_per_request,
            handler: None,
            rows_retrieved: 0,
            total_rows: None,
            buffered: Vec::new().into_iter(),
            finished: false,
        }
    }

    /// Calls `handler` with every page as soon as it is received.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&Report) + 'a,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Rows received so far, across all pages.
    pub fn rows_retrieved(&self) -> u64 {
        self.rows_retrieved
    }

    /// Server-reported total, known once the first page has arrived.
    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetches the next page, or `None` once all rows have been retrieved.
    ///
    /// Rows returned here are not yielded again by the iterator.
    pub fn next_page(&mut self) -> Result<Option<Report>> {
        if self.finished {
            return Ok(None);
        }
        if self.rows_per_request == 0 {
            self.finished = true;
            return Err(ReportingError::Config(
                "rows per request must be greater than zero".into(),
            ));
        }

        let report = match self
            .client
            .request(self.rows_retrieved + 1, self.rows_per_request)
        {
            Ok(report) => report,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        if let Some(handler) = self.handler.as_mut() {
            handler(&report);
        }

        let total = report.all_rows_count();
        self.total_rows = Some(total);
        self.rows_retrieved += report.rows_count() as u64;

        if self.rows_retrieved >= total {
            debug!(rows = self.rows_retrieved, total, "all report rows retrieved");
            self.finished = true;
        } else if report.is_empty() {
            warn!(
                rows = self.rows_retrieved,
                total, "server returned an empty page before the reported total; stopping"
            );
            self.finished = true;
        }

        Ok(Some(report))
    }
}

impl Iterator for RowPager<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buffered.next() {
                return Some(Ok(row));
            }
            match self.next_page() {
                Ok(Some(report)) => {
                    self.buffered = report.into_rows().collect::<Vec<_>>().into_iter();
                }
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl std::iter::FusedIterator for RowPager<'_> {}

impl fmt::Debug for RowPager<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowPager")
            .field("rows_per_request", &self.rows_per_request)
            .field("rows_retrieved", &self.rows_retrieved)
            .field("total_rows", &self.total_rows)
            .field("buffered", &self.buffered.len())
            .field("finished", &self.finished)
            .finish()
    }
}

use chrono::{DateTime, NaiveDate, TimeZone};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReportingError, Result};

/// Prefix the reporting API expects in front of a counter id.
pub const COUNTER_ID_PREFIX: &str = "ga:";

/// A report date: literal date, relative offset or named shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateSpec {
    /// Calendar date, sent as `YYYY-MM-DD`.
    Date(NaiveDate),
    /// `N` days before the day the server handles the request (`NdaysAgo`).
    DaysAgo(u32),
    #[default]
    Today,
    Yesterday,
    /// Any other string the server understands, passed through unchanged.
    Literal(String),
}

impl DateSpec {
    /// Query parameter value for this date.
    pub fn as_param(&self) -> String {
        match self {
            DateSpec::Date(d) => d.format("%Y-%m-%d").to_string(),
            DateSpec::DaysAgo(n) => format!("{}daysAgo", n),
            DateSpec::Today => "today".to_string(),
            DateSpec::Yesterday => "yesterday".to_string(),
            DateSpec::Literal(s) => s.clone(),
        }
    }
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_param())
    }
}

impl From<NaiveDate> for DateSpec {
    fn from(date: NaiveDate) -> Self {
        DateSpec::Date(date)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateSpec {
    fn from(dt: DateTime<Tz>) -> Self {
        DateSpec::Date(dt.date_naive())
    }
}

impl From<u32> for DateSpec {
    fn from(days: u32) -> Self {
        DateSpec::DaysAgo(days)
    }
}

impl From<&str> for DateSpec {
    fn from(s: &str) -> Self {
        match s {
            "today" => DateSpec::Today,
            "yesterday" => DateSpec::Yesterday,
            other => DateSpec::Literal(other.to_string()),
        }
    }
}

impl From<String> for DateSpec {
    fn from(s: String) -> Self {
        DateSpec::from(s.as_str())
    }
}

/// Server-side accuracy/speed tradeoff for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingLevel {
    #[default]
    Default,
    Faster,
    HigherPrecision,
}

impl SamplingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingLevel::Default => "DEFAULT",
            SamplingLevel::Faster => "FASTER",
            SamplingLevel::HigherPrecision => "HIGHER_PRECISION",
        }
    }
}

impl fmt::Display for SamplingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingLevel {
    type Err = ReportingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "DEFAULT" => Ok(SamplingLevel::Default),
            "FASTER" => Ok(SamplingLevel::Faster),
            "HIGHER_PRECISION" => Ok(SamplingLevel::HigherPrecision),
            other => Err(ReportingError::Config(format!(
                "unknown sampling level [{}]",
                other
            ))),
        }
    }
}

/// One metric/dimension name or a list of them.
pub trait IntoNames {
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoNames for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self
    }
}

impl IntoNames for Vec<&str> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoNames for &[&str] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoNames for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

/// Replaces any leading whitespace/non-digit run with [`COUNTER_ID_PREFIX`].
pub fn normalize_counter_id(id: &str) -> String {
    let rest = id.trim_start_matches(|c: char| c.is_whitespace() || !c.is_ascii_digit());
    format!("{}{}", COUNTER_ID_PREFIX, rest)
}

/// Parameters of a report request.
///
/// Setters consume the query and return the updated value, so one query can
/// be cloned and specialised without affecting other holders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    counter_id: Option<String>,
    metrics: Vec<String>,
    dimensions: Vec<String>,
    start_date: DateSpec,
    end_date: DateSpec,
    filters: String,
    sort: String,
    sampling_level: SamplingLevel,
}

impl ReportQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the counter id, with or without the `ga:` prefix.
    pub fn with_counter_id(mut self, id: impl fmt::Display) -> Self {
        self.counter_id = Some(normalize_counter_id(&id.to_string()));
        self
    }

    pub fn with_metrics(mut self, metrics: impl IntoNames) -> Self {
        self.metrics = metrics.into_names();
        self
    }

    pub fn with_dimensions(mut self, dimensions: impl IntoNames) -> Self {
        self.dimensions = dimensions.into_names();
        self
    }

    /// Sets the report period.
    ///
    /// Dates can be given as:
    /// - `chrono::NaiveDate` or `chrono::DateTime`
    /// - an integer, interpreted as N days ago
    /// - `"today"` / `"yesterday"`
    /// - a `"YYYY-MM-DD"` string
    pub fn with_period(mut self, from: impl Into<DateSpec>, to: impl Into<DateSpec>) -> Self {
        self.start_date = from.into();
        self.end_date = to.into();
        self
    }

    /// Sets the start of the period; the end becomes `today`.
    pub fn with_start_date(self, from: impl Into<DateSpec>) -> Self {
        self.with_period(from, DateSpec::Today)
    }

    /// Filter expression in the server's grammar, e.g. `ga:pageviews>10`.
    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = filters.into();
        self
    }

    /// Sort expression, e.g. `-ga:visits`.
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn with_sampling_level(mut self, level: SamplingLevel) -> Self {
        self.sampling_level = level;
        self
    }

    pub fn counter_id(&self) -> Option<&str> {
        self.counter_id.as_deref()
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn start_date(&self) -> &DateSpec {
        &self.start_date
    }

    pub fn end_date(&self) -> &DateSpec {
        &self.end_date
    }

    pub fn filters(&self) -> &str {
        &self.filters
    }

    pub fn sort(&self) -> &str {
        &self.sort
    }

    pub fn sampling_level(&self) -> SamplingLevel {
        self.sampling_level
    }

    /// Checks that the query can be sent: counter id and at least one metric.
    pub fn validate(&self) -> Result<()> {
        if self.counter_id.is_none() || self.metrics.is_empty() {
            return Err(ReportingError::Config(
                "counter identifier and metric param must be specified".to_string(),
            ));
        }
        Ok(())
    }

    /// Query parameters for one page of this report.
    pub(crate) fn to_params(&self, start: u64, count: u32) -> Vec<(String, String)> {
        vec![
            ("ids".into(), self.counter_id.clone().unwrap_or_default()),
            ("start-date".into(), self.start_date.as_param()),
            ("end-date".into(), self.end_date.as_param()),
            ("metrics".into(), self.metrics.join(",")),
            ("dimensions".into(), self.dimensions.join(",")),
            ("samplingLevel".into(), self.sampling_level.to_string()),
            ("filters".into(), self.filters.clone()),
            ("sort".into(), self.sort.clone()),
            ("start-index".into(), start.to_string()),
            ("max-results".into(), count.to_string()),
        ]
    }
}

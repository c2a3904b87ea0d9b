use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ReportingError, Result};

/// Column descriptor from `columnHeaders`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    pub name: String,
    /// `DIMENSION` or `METRIC`.
    #[serde(default)]
    pub column_type: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody {
    column_headers: Vec<ColumnHeader>,
    // Omitted by the server when the page is empty.
    #[serde(default)]
    rows: Vec<Vec<Value>>,
    #[serde(deserialize_with = "total_results")]
    total_results: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TotalResults {
    Number(u64),
    Text(String),
}

fn total_results<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match TotalResults::deserialize(deserializer)? {
        TotalResults::Number(n) => Ok(n),
        TotalResults::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("totalResults is not a number: {:?}", s))),
    }
}

/// One page of report results.
#[derive(Debug, Clone)]
pub struct Report {
    column_headers: Vec<ColumnHeader>,
    header: Arc<[String]>,
    rows: Vec<Vec<Value>>,
    total_results: u64,
    raw: Value,
}

impl Report {
    /// Builds a report from a decoded response.
    ///
    /// Fails if `columnHeaders` or `totalResults` is missing, a column name is
    /// repeated, or a row does not have one value per column.
    pub fn from_value(raw: Value) -> Result<Self> {
        let body: ReportBody = serde_json::from_value(raw.clone())?;

        {
            let mut seen = HashSet::new();
            for column in &body.column_headers {
                if !seen.insert(column.name.as_str()) {
                    return Err(ReportingError::Malformed(format!(
                        "duplicate column name [{}]",
                        column.name
                    )));
                }
            }
        }

        let width = body.column_headers.len();
        if let Some((idx, row)) = body.rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(ReportingError::Malformed(format!(
                "row {} has {} value(s), expected {}",
                idx,
                row.len(),
                width
            )));
        }

        let header: Arc<[String]> = body.column_headers.iter().map(|c| c.name.clone()).collect();

        Ok(Self {
            column_headers: body.column_headers,
            header,
            rows: body.rows,
            total_results: body.total_results,
            raw,
        })
    }

    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Self::from_value(serde_json::from_slice(body)?)
    }

    /// Column names, in response order.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn column_headers(&self) -> &[ColumnHeader] {
        &self.column_headers
    }

    /// Rows of this page as records. Each call starts from the first row.
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows.iter().map(|values| Row {
            columns: Arc::clone(&self.header),
            values: values.clone(),
        })
    }

    pub fn rows_as_vec(&self) -> Vec<Row> {
        self.rows().collect()
    }

    pub fn into_rows(self) -> impl Iterator<Item = Row> {
        let header = self.header;
        self.rows.into_iter().map(move |values| Row {
            columns: Arc::clone(&header),
            values,
        })
    }

    /// Total rows matching the query, as reported by the server.
    pub fn all_rows_count(&self) -> u64 {
        self.total_results
    }

    /// Rows present in this page.
    pub fn rows_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_sampled_data(&self) -> Option<bool> {
        self.raw.get("containsSampledData").and_then(Value::as_bool)
    }

    /// The decoded response as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// One report row: column name to value, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

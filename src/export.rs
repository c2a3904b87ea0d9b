use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::client::{Client, DEFAULT_ROWS_PER_REQUEST};
use crate::error::Result;
use crate::report::Row;

/// CSV layout for [`Client::save_to_csv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Write the column names as the first record.
    pub write_header: bool,
    pub delimiter: u8,
    /// Enclosure character for quoted fields.
    pub quote: u8,
    /// Escape character for quotes inside fields. `None` doubles them.
    pub escape: Option<u8>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            write_header: true,
            delimiter: b',',
            quote: b'"',
            escape: None,
        }
    }
}

impl CsvOptions {
    pub fn with_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_escape(mut self, escape: u8) -> Self {
        self.escape = Some(escape);
        self
    }

    fn writer<W: Write>(&self, out: W) -> csv::Writer<W> {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .terminator(csv::Terminator::Any(b'\n'));
        if let Some(escape) = self.escape {
            builder.double_quote(false).escape(escape);
        }
        builder.from_writer(out)
    }
}

fn field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn write_row<W: Write>(out: &mut csv::Writer<W>, row: &Row) -> Result<()> {
    out.write_record(row.values().iter().map(field))?;
    Ok(())
}

impl Client {
    /// Writes every row of the report to `path` as CSV and returns the number
    /// of rows written. The file is created or truncated.
    ///
    /// With `write_header`, the first record holds the column names of the
    /// first page, even when the report has no rows.
    pub fn save_to_csv(&self, path: impl AsRef<Path>, options: &CsvOptions) -> Result<u64> {
        let path = path.as_ref();
        let mut out = options.writer(File::create(path)?);

        let pb = if self.progress() {
            let pb = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} {pos}/{len} rows ({per_sec}) {wide_bar} {eta}",
            ) {
                pb.set_style(style.progress_chars("=>-"));
            }
            Some(pb)
        } else {
            None
        };

        let mut pager = self.rows(DEFAULT_ROWS_PER_REQUEST);
        let mut written = 0u64;
        let mut first_page = true;

        while let Some(report) = pager.next_page()? {
            if first_page {
                if options.write_header {
                    out.write_record(report.header())?;
                }
                if let Some(pb) = &pb {
                    pb.set_length(report.all_rows_count());
                }
                first_page = false;
            }

            for row in report.rows() {
                write_row(&mut out, &row)?;
                written += 1;
            }
            if let Some(pb) = &pb {
                pb.set_position(written);
            }
        }

        out.flush()?;
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        info!(path = %path.display(), rows = written, "report saved to CSV");
        Ok(written)
    }
}

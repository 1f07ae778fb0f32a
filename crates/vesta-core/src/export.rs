//! Streaming result formatters for bulk exports.
//!
//! A formatter consumes paged record batches and writes a complete, well
//! formed output without ever buffering more than the page it was handed.
//! The lifecycle is fixed: `write(first_page)` opens the output, `append`
//! adds records with correct separators, `finish` closes the structure and
//! releases the sink exactly once.

use std::future::Future;

use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::DataError;
use crate::flatten::flatten;
use crate::models::OutputFormat;

/// Streaming encoder consuming paged record batches.
pub trait ResponseFormatter: Send {
    /// Opens the output using the first page: the array opener for JSON, the
    /// header row for CSV.
    fn write(&mut self, page: &[Value]) -> impl Future<Output = Result<(), DataError>> + Send;

    /// Writes a page of records. `is_first_page` controls the leading
    /// separator of the page's first record.
    fn append(
        &mut self,
        page: &[Value],
        is_first_page: bool,
    ) -> impl Future<Output = Result<(), DataError>> + Send;

    /// Closes the output structure, flushes, and releases the sink.
    fn finish(&mut self) -> impl Future<Output = Result<(), DataError>> + Send;
}

/// Streams records as one JSON array.
pub struct JsonFormatter<W> {
    sink: W,
    finished: bool,
}

impl<W: AsyncWrite + Unpin + Send> JsonFormatter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, finished: false }
    }
}

impl<W: AsyncWrite + Unpin + Send> ResponseFormatter for JsonFormatter<W> {
    async fn write(&mut self, _page: &[Value]) -> Result<(), DataError> {
        self.sink.write_all(b"[").await?;
        Ok(())
    }

    async fn append(&mut self, page: &[Value], is_first_page: bool) -> Result<(), DataError> {
        let mut needs_separator = !is_first_page;
        for record in page {
            if needs_separator {
                self.sink.write_all(b",\n").await?;
            }
            let json = serde_json::to_string(record)?;
            self.sink.write_all(json.as_bytes()).await?;
            needs_separator = true;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), DataError> {
        if self.finished {
            return Ok(());
        }
        self.sink.write_all(b"]").await?;
        self.sink.flush().await?;
        self.sink.shutdown().await?;
        self.finished = true;
        Ok(())
    }
}

/// Streams flattened records as CSV rows.
///
/// The header is computed once, from the first page's flattened field set,
/// and stays stable for the whole export: fields first appearing in later
/// pages are dropped, and a record missing a header field renders `NAN` in
/// that column.
pub struct CsvFormatter<W> {
    sink: W,
    header: Vec<String>,
    finished: bool,
}

impl<W: AsyncWrite + Unpin + Send> CsvFormatter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, header: Vec::new(), finished: false }
    }
}

impl<W: AsyncWrite + Unpin + Send> ResponseFormatter for CsvFormatter<W> {
    async fn write(&mut self, page: &[Value]) -> Result<(), DataError> {
        for record in page {
            for key in flatten(record).keys() {
                if !self.header.iter().any(|h| h == key) {
                    self.header.push(key.clone());
                }
            }
        }
        if self.header.is_empty() {
            return Ok(());
        }
        let row = self
            .header
            .iter()
            .map(|field| escape_csv(field))
            .collect::<Vec<_>>()
            .join(",");
        self.sink.write_all(row.as_bytes()).await?;
        self.sink.write_all(b"\n").await?;
        Ok(())
    }

    async fn append(&mut self, page: &[Value], _is_first_page: bool) -> Result<(), DataError> {
        for record in page {
            let flat = flatten(record);
            let row = self
                .header
                .iter()
                .map(|field| flat.get(field).map_or_else(|| "NAN".to_string(), render_cell))
                .collect::<Vec<_>>()
                .join(",");
            self.sink.write_all(row.as_bytes()).await?;
            self.sink.write_all(b"\n").await?;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), DataError> {
        if self.finished {
            return Ok(());
        }
        self.sink.flush().await?;
        self.sink.shutdown().await?;
        self.finished = true;
        Ok(())
    }
}

/// Unified formatter wrapping the concrete encoders.
///
/// [`ResponseFormatter`] uses `impl Future` return types (RPITIT), making it
/// not object-safe; this enum provides static dispatch over the runtime
/// format selection instead.
pub enum FormatterEnum<W> {
    /// JSON array encoder.
    Json(JsonFormatter<W>),
    /// Flattened CSV encoder.
    Csv(CsvFormatter<W>),
}

impl<W: AsyncWrite + Unpin + Send> ResponseFormatter for FormatterEnum<W> {
    async fn write(&mut self, page: &[Value]) -> Result<(), DataError> {
        match self {
            Self::Json(f) => f.write(page).await,
            Self::Csv(f) => f.write(page).await,
        }
    }

    async fn append(&mut self, page: &[Value], is_first_page: bool) -> Result<(), DataError> {
        match self {
            Self::Json(f) => f.append(page, is_first_page).await,
            Self::Csv(f) => f.append(page, is_first_page).await,
        }
    }

    async fn finish(&mut self) -> Result<(), DataError> {
        match self {
            Self::Json(f) => f.finish().await,
            Self::Csv(f) => f.finish().await,
        }
    }
}

/// Creates the formatter for the requested output encoding.
///
/// Parquet is a declared output token without an implementation; requesting
/// it fails instead of silently producing a different encoding.
pub fn formatter_for<W: AsyncWrite + Unpin + Send>(
    format: OutputFormat,
    sink: W,
) -> Result<FormatterEnum<W>, DataError> {
    match format {
        OutputFormat::Json => Ok(FormatterEnum::Json(JsonFormatter::new(sink))),
        OutputFormat::Csv => Ok(FormatterEnum::Csv(CsvFormatter::new(sink))),
        OutputFormat::Parquet => Err(DataError::Validation(
            "parquet export is not supported yet".to_string(),
        )),
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => escape_csv(s),
        other => other.to_string(),
    }
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

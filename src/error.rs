use thiserror::Error;

/// Errors raised while reading or writing a table.
///
/// The `Display` text of every variant is shown to the user as-is, so the
/// messages are phrased for a person looking at the page.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("unsupported file type: {0} (expected .csv or .xlsx)")]
    UnsupportedFileType(String),

    #[error("No columns to parse from file")]
    Empty,

    #[error("file is not valid UTF-8 text (line {line})")]
    InvalidUtf8 { line: u64 },

    #[error("Expected {expected} fields in line {line}, saw {found}")]
    RaggedRow {
        expected: usize,
        line: u64,
        found: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("No sheets found in Excel file")]
    NoSheets,

    #[error("failed to write Excel file: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),
}

/// Errors raised while drawing a chart.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("table has no rows to plot")]
    NoRows,

    #[error("failed to render chart: {0}")]
    Render(String),
}

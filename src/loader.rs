use crate::error::TableError;
use crate::table::{Cell, Table};
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use log::debug;
use std::io::Cursor;

/// Spreadsheet formats the app reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// Detect the format of an uploaded file from its name suffix.
    ///
    /// The comparison ignores ASCII case, so `DATA.CSV` is a CSV file.
    ///
    /// # Arguments
    /// * `name` - File name as sent by the browser
    ///
    /// # Returns
    /// * `Result<FileFormat, TableError>` - The format, or `UnsupportedFileType`
    ///
    /// # Examples
    /// ```
    /// use growth_mindset::loader::FileFormat;
    ///
    /// assert_eq!(FileFormat::from_file_name("goals.csv").unwrap(), FileFormat::Csv);
    /// assert_eq!(FileFormat::from_file_name("Goals.XLSX").unwrap(), FileFormat::Xlsx);
    /// assert!(FileFormat::from_file_name("notes.txt").is_err());
    /// ```
    pub fn from_file_name(name: &str) -> Result<FileFormat, TableError> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else if lower.ends_with(".xlsx") {
            Ok(FileFormat::Xlsx)
        } else {
            Err(TableError::UnsupportedFileType(name.to_string()))
        }
    }

    /// The format a file of this format converts to
    pub fn opposite(self) -> FileFormat {
        match self {
            FileFormat::Csv => FileFormat::Xlsx,
            FileFormat::Xlsx => FileFormat::Csv,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            FileFormat::Csv => "text/csv",
            FileFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// Load a table from CSV bytes
///
/// The first record is the header. Each field is typed with
/// [`Cell::infer`] and each column with the kind of its cells.
///
/// # Arguments
/// * `bytes` - Raw file content, optionally starting with a UTF-8 byte order mark
///
/// # Returns
/// * `Result<Table, TableError>` - The parsed table or an error
///
/// # Errors
/// * `Empty` if there is no header record
/// * `InvalidUtf8` if any field is not UTF-8
/// * `RaggedRow` if a row has more fields than the header
///
/// # Examples
/// ```
/// use growth_mindset::loader::from_csv;
///
/// let table = from_csv(b"a,b\n1,2\n3,4\n").unwrap();
/// assert_eq!(table.column_names(), vec!["a", "b"]);
/// assert_eq!(table.row_count(), 2);
/// ```
pub fn from_csv(bytes: &[u8]) -> Result<Table, TableError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = reader.byte_records();

    let header_record = match records.next() {
        Some(record) => record?,
        None => return Err(TableError::Empty),
    };
    let header = decode_record(&header_record)?;
    let width = header.len();

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        if record.len() > width {
            return Err(TableError::RaggedRow {
                expected: width,
                line: record_line(&record),
                found: record.len(),
            });
        }
        let fields = decode_record(&record)?;
        rows.push(fields.iter().map(|field| Cell::infer(field)).collect());
    }

    debug!("parsed CSV with {} columns and {} rows", width, rows.len());
    Ok(Table::from_rows(header, rows))
}

fn record_line(record: &csv::ByteRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn decode_record(record: &csv::ByteRecord) -> Result<Vec<String>, TableError> {
    record
        .iter()
        .map(|field| {
            std::str::from_utf8(field)
                .map(str::to_string)
                .map_err(|_| TableError::InvalidUtf8 {
                    line: record_line(record),
                })
        })
        .collect()
}

/// Load a table from the first worksheet of an XLSX workbook
///
/// The first row is the header. Integral numbers are read back as integers,
/// which is what spreadsheet readers do for cells written from integer
/// columns.
///
/// # Arguments
/// * `bytes` - Raw workbook content
///
/// # Returns
/// * `Result<Table, TableError>` - The parsed table or an error
pub fn from_xlsx(bytes: &[u8]) -> Result<Table, TableError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(TableError::NoSheets)?;

    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(first) => first.iter().map(|data| xlsx_cell(data).to_string()).collect(),
        None => return Ok(Table::default()),
    };

    let body: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(xlsx_cell).collect())
        .collect();

    debug!(
        "parsed worksheet '{}' with {} columns and {} rows",
        sheet_name,
        header.len(),
        body.len()
    );
    Ok(Table::from_rows(header, body))
}

// Largest float that still converts to an integer without losing precision
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn xlsx_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT => {
            Cell::Int(*f as i64)
        }
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

/// Detect file type and load the appropriate format
///
/// # Examples
/// ```
/// use growth_mindset::loader::load_table;
///
/// let table = load_table("scores.csv", b"week,score\n1,10\n2,12\n").unwrap();
/// assert_eq!(table.numeric_columns(), vec!["week", "score"]);
///
/// assert!(load_table("scores.txt", b"week,score\n").is_err());
/// ```
pub fn load_table(name: &str, bytes: &[u8]) -> Result<Table, TableError> {
    match FileFormat::from_file_name(name)? {
        FileFormat::Csv => from_csv(bytes),
        FileFormat::Xlsx => from_xlsx(bytes),
    }
}

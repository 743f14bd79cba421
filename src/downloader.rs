use crate::error::TableError;
use crate::loader::{FileFormat, load_table};
use crate::table::{Cell, Table};
use log::info;
use rust_xlsxwriter::{Workbook, Worksheet};

// Largest integer magnitude a worksheet number holds exactly
const MAX_EXACT_INT: u64 = 1 << 53;

/// A converted file ready to be offered as a download
#[derive(Debug, Clone)]
pub struct Converted {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: &'static str,
}

/// Convert a table to CSV format
///
/// This function writes the header row followed by one record per table
/// row. Missing values become empty fields, floats keep a fractional digit
/// and booleans are written as `True`/`False`. Quoting of commas, quotes and
/// newlines is left to the CSV writer.
///
/// # Arguments
/// * `table` - Reference to the table to convert
///
/// # Returns
/// * `Result<String, TableError>` - CSV content as a string or an error
///
/// # Examples
/// ```
/// use growth_mindset::loader::from_csv;
/// use growth_mindset::downloader::to_csv;
///
/// let table = from_csv(b"name,score\n\"Smith, J\",1.5\n").unwrap();
/// assert_eq!(to_csv(&table).unwrap(), "name,score\n\"Smith, J\",1.5\n");
/// ```
pub fn to_csv(table: &Table) -> Result<String, TableError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TableError::Csv(e.into_error().into()))?;

    // Every field came from a `String`, so the buffer is valid UTF-8
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Convert a table to XLSX format
///
/// This function exports a table to a single worksheet using the
/// rust_xlsxwriter library. Header names go in the first row and values
/// follow from the second row; no index column is written. Missing values
/// leave the cell blank.
///
/// # Arguments
/// * `table` - Reference to the table to convert
///
/// # Returns
/// * `Result<Vec<u8>, TableError>` - XLSX file content as bytes or an error
pub fn to_xlsx(table: &Table) -> Result<Vec<u8>, TableError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (c, column) in table.columns().iter().enumerate() {
        let col = c as u16;
        worksheet.write_string(0, col, column.name())?;

        for (r, cell) in column.cells().iter().enumerate() {
            let row = (r + 1) as u32;
            match cell {
                Cell::Empty => {}
                // Worksheet numbers are doubles, so integers past 2^53 keep
                // their digits as text
                Cell::Int(i) if i.unsigned_abs() > MAX_EXACT_INT => {
                    worksheet.write_string(row, col, i.to_string())?;
                }
                Cell::Int(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                Cell::Float(f) => {
                    worksheet.write_number(row, col, *f)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
            }
        }
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Convert an uploaded file to the opposite format
///
/// A `.csv` upload becomes `converted_file.xlsx` and an `.xlsx` upload
/// becomes `converted_file.csv`. Everything happens in memory.
///
/// # Arguments
/// * `name` - Uploaded file name, used only to pick the input format
/// * `bytes` - Uploaded file content
///
/// # Returns
/// * `Result<Converted, TableError>` - The converted file or the parse/write error
pub fn convert(name: &str, bytes: &[u8]) -> Result<Converted, TableError> {
    let source = FileFormat::from_file_name(name)?;
    let table = load_table(name, bytes)?;
    let target = source.opposite();

    let bytes = match target {
        FileFormat::Xlsx => to_xlsx(&table)?,
        FileFormat::Csv => to_csv(&table)?.into_bytes(),
    };

    info!(
        "converted '{}' to {} ({} bytes)",
        name,
        target.extension(),
        bytes.len()
    );

    Ok(Converted {
        bytes,
        file_name: format!("converted_file.{}", target.extension()),
        content_type: target.content_type(),
    })
}

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Strings read as a missing value, the same set data-frame readers use by
/// default.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single value in a table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    /// Infer a cell from raw text.
    ///
    /// Missing markers become `Empty`, then integers, floats and the
    /// `True`/`False` spellings are tried in that order. Anything else is
    /// kept as text.
    ///
    /// # Examples
    /// ```
    /// use growth_mindset::table::Cell;
    ///
    /// assert_eq!(Cell::infer("42"), Cell::Int(42));
    /// assert_eq!(Cell::infer("2.5"), Cell::Float(2.5));
    /// assert_eq!(Cell::infer("NaN"), Cell::Empty);
    /// assert_eq!(Cell::infer("TRUE"), Cell::Bool(true));
    /// assert_eq!(Cell::infer("hello"), Cell::Text("hello".to_string()));
    /// ```
    pub fn infer(raw: &str) -> Cell {
        if MISSING_MARKERS.contains(&raw) {
            return Cell::Empty;
        }

        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_nan() {
                return Cell::Empty;
            }
            return Cell::Float(f);
        }

        match trimmed {
            "True" | "true" | "TRUE" => Cell::Bool(true),
            "False" | "false" | "FALSE" => Cell::Bool(false),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric view of the cell, `None` for anything that is not a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => f.write_str(&format_float(*v)),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Format a float so that integral values keep a fractional digit (`1.0`)
fn format_float(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Inferred type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    /// Infer the kind of a column from all of its cells.
    ///
    /// An integer column with a missing value widens to `Float`, and a column
    /// whose cells are all missing is `Float` as well. A column without any
    /// rows is `Text`.
    pub fn infer(cells: &[Cell]) -> ColumnKind {
        if cells.is_empty() {
            return ColumnKind::Text;
        }

        let mut ints = 0usize;
        let mut floats = 0usize;
        let mut bools = 0usize;
        let mut empties = 0usize;

        for cell in cells {
            match cell {
                Cell::Empty => empties += 1,
                Cell::Int(_) => ints += 1,
                Cell::Float(_) => floats += 1,
                Cell::Bool(_) => bools += 1,
                Cell::Text(_) => return ColumnKind::Text,
            }
        }

        if bools > 0 {
            if ints + floats > 0 {
                ColumnKind::Text
            } else {
                ColumnKind::Bool
            }
        } else if floats > 0 || empties > 0 {
            ColumnKind::Float
        } else {
            ColumnKind::Int
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }
}

/// A named column with its inferred kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<Cell>,
}

impl Column {
    /// Build a column, inferring its kind. Integers in a float column are
    /// widened so that every number in it displays the same way.
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let kind = ColumnKind::infer(&cells);
        let cells = if kind == ColumnKind::Float {
            cells
                .into_iter()
                .map(|cell| match cell {
                    Cell::Int(i) => Cell::Float(i as f64),
                    other => other,
                })
                .collect()
        } else {
            cells
        };

        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric()
    }
}

/// In-memory tabular dataset: rows by named columns.
///
/// Every column holds the same number of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table from a header and row-major cells.
    ///
    /// Headers are made unique the way data-frame readers do it: an empty
    /// header at index `i` becomes `Unnamed: i` and repeats get `.1`, `.2`, …
    /// appended. Short rows are padded with empty cells; extra cells are
    /// dropped.
    ///
    /// # Examples
    /// ```
    /// use growth_mindset::table::{Cell, Table};
    ///
    /// let table = Table::from_rows(
    ///     vec!["a".to_string(), "a".to_string()],
    ///     vec![vec![Cell::Int(1), Cell::Int(2)]],
    /// );
    /// let names: Vec<&str> = table.columns().iter().map(|c| c.name()).collect();
    /// assert_eq!(names, vec!["a", "a.1"]);
    /// ```
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let names = dedupe_headers(header);
        let width = names.len();

        let mut columns: Vec<Vec<Cell>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or(Cell::Empty));
            }
        }

        Self {
            columns: names
                .into_iter()
                .zip(columns)
                .map(|(name, cells)| Column::new(name, cells))
                .collect(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    /// Names of all numeric columns, in table order
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Values of a numeric column with missing cells as `None`.
    ///
    /// Returns `None` when the column is absent or not numeric.
    pub fn numeric_series(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let column = self.column(name)?;
        if !column.is_numeric() {
            return None;
        }
        Some(column.cells.iter().map(Cell::as_f64).collect())
    }

    /// Iterate the table row by row
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count()).map(move |r| self.columns.iter().map(|c| &c.cells[r]).collect())
    }
}

fn dedupe_headers(header: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());

    for (index, raw) in header.into_iter().enumerate() {
        let base = if raw.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            raw
        };

        let mut name = base.clone();
        while used.contains(&name) {
            let counter = counters.entry(base.clone()).or_insert(0);
            *counter += 1;
            name = format!("{}.{}", base, counter);
        }
        used.insert(name.clone());
        names.push(name);
    }

    names
}

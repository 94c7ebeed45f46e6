/// File ingestion: decode an upload into a typed `Table`.
///
/// CSV goes through the `csv` crate, XLSX through `calamine`. Both produce
/// rows of `RawCell`s which are then typed column by column:
///
/// - no rows → STRING
/// - every cell missing → FLOAT64 (all null)
/// - all present cells boolean → BOOL
/// - all cells integers, none missing → INT64
/// - all present cells integers or floats → FLOAT64
/// - anything else → STRING

use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::{Result, SweepError};
use crate::table::Table;
use crate::upload::{FileFormat, UploadedFile};
use calamine::{Data, DataType, Reader, Xlsx};
use log::warn;
use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Cursor;

/// Strings read as missing values.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One cell as read from the source, before column typing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Missing,
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl RawCell {
    /// Classify a CSV field.
    pub fn classify(field: &str) -> Self {
        let trimmed = field.trim();
        if MISSING_TOKENS.contains(&field) || MISSING_TOKENS.contains(&trimmed) {
            return RawCell::Missing;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return RawCell::Integer(n);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            // `parse` accepts NaN spellings in any case
            return if f.is_nan() { RawCell::Missing } else { RawCell::Float(f) };
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return RawCell::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return RawCell::Bool(false);
        }
        RawCell::Text(field.to_string())
    }

    /// Text form used when the cell ends up in a STRING column.
    fn into_text(self) -> Option<String> {
        match self {
            RawCell::Missing => None,
            RawCell::Integer(n) => Some(n.to_string()),
            RawCell::Float(f) => Some(f.to_string()),
            RawCell::Bool(b) => Some(if b { "True" } else { "False" }.to_string()),
            RawCell::Text(s) => Some(s),
        }
    }
}

/// Read an upload into a table named after the file.
pub fn read_table(file: &UploadedFile) -> Result<Table> {
    let (headers, rows) = match file.format()? {
        FileFormat::Csv => read_csv_records(&file.bytes)?,
        FileFormat::Xlsx => read_xlsx_records(&file.bytes)?,
    };
    build_table(&file.name, headers, rows)
}

/// Decode CSV bytes: UTF-8 (BOM stripped), falling back to Windows-1252.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return text;
    }
    warn!("Input is not valid UTF-8, decoding as Windows-1252");
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text
}

/// Parse CSV bytes into a header and classified rows.
pub fn read_csv_records(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<RawCell>>)> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(SweepError::EmptyFile);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(SweepError::Malformed(format!(
                "Expected {} fields in line {}, saw {}",
                headers.len(),
                line,
                record.len()
            )));
        }
        let mut row: Vec<RawCell> = record.iter().map(RawCell::classify).collect();
        row.resize(headers.len(), RawCell::Missing);
        rows.push(row);
    }

    Ok((headers, rows))
}

/// Read the first worksheet of an XLSX workbook. The first row is the header.
pub fn read_xlsx_records(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<RawCell>>)> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SweepError::EmptyFile)??;

    let mut row_iter = range.rows();
    let headers: Vec<String> = match row_iter.next() {
        Some(row) => row
            .iter()
            .map(|cell| match excel_cell(cell) {
                RawCell::Missing => String::new(),
                other => other.into_text().unwrap_or_default(),
            })
            .collect(),
        None => return Err(SweepError::EmptyFile),
    };

    let rows = row_iter
        .map(|row| {
            let mut cells: Vec<RawCell> = row.iter().map(excel_cell).collect();
            cells.resize(headers.len(), RawCell::Missing);
            cells
        })
        .collect();

    Ok((headers, rows))
}

/// Spreadsheet cells keep their stored type; integral floats count as integers.
fn excel_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Missing,
        Data::Int(n) => RawCell::Integer(*n),
        Data::Float(f) if f.is_nan() => RawCell::Missing,
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
                RawCell::Integer(*f as i64)
            } else {
                RawCell::Float(*f)
            }
        }
        Data::Bool(b) => RawCell::Bool(*b),
        Data::String(s) => RawCell::Text(s.clone()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| RawCell::Text(dt.to_string()))
            .unwrap_or(RawCell::Missing),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}

/// Blank headers become `Unnamed: i`; repeats get `.1`, `.2`, ... suffixes.
pub fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, header)| {
            let base = if header.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                header
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            name
        })
        .collect()
}

/// Decide the type of one column from its cells.
pub fn infer_column_type(cells: &[RawCell]) -> ColumnType {
    if cells.is_empty() {
        return ColumnType::String;
    }

    let mut missing = false;
    let (mut ints, mut floats, mut bools, mut texts) = (0usize, 0usize, 0usize, 0usize);
    for cell in cells {
        match cell {
            RawCell::Missing => missing = true,
            RawCell::Integer(_) => ints += 1,
            RawCell::Float(_) => floats += 1,
            RawCell::Bool(_) => bools += 1,
            RawCell::Text(_) => texts += 1,
        }
    }

    if ints + floats + bools + texts == 0 {
        return ColumnType::Float64;
    }
    if texts > 0 || (bools > 0 && ints + floats > 0) {
        return ColumnType::String;
    }
    if bools > 0 {
        return ColumnType::Bool;
    }
    if floats == 0 && !missing {
        ColumnType::Int64
    } else {
        ColumnType::Float64
    }
}

fn typed_value(cell: RawCell, column_type: ColumnType) -> ColumnValue {
    match (column_type, cell) {
        (_, RawCell::Missing) => ColumnValue::Null,
        (ColumnType::Int64, RawCell::Integer(n)) => ColumnValue::Int64(n),
        (ColumnType::Float64, RawCell::Integer(n)) => ColumnValue::Float64(n as f64),
        (ColumnType::Float64, RawCell::Float(f)) => ColumnValue::Float64(f),
        (ColumnType::Bool, RawCell::Bool(b)) => ColumnValue::Bool(b),
        (_, cell) => cell
            .into_text()
            .map(ColumnValue::String)
            .unwrap_or(ColumnValue::Null),
    }
}

/// Type each column and assemble the table.
pub fn build_table(name: &str, headers: Vec<String>, rows: Vec<Vec<RawCell>>) -> Result<Table> {
    let headers = normalize_headers(headers);
    let mut cells_by_column: Vec<Vec<RawCell>> = headers
        .iter()
        .map(|_| Vec::with_capacity(rows.len()))
        .collect();
    for row in rows {
        for (col_cells, cell) in cells_by_column.iter_mut().zip(row) {
            col_cells.push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells_by_column)
        .map(|(header, cells)| {
            let column_type = infer_column_type(&cells);
            let values = cells
                .into_iter()
                .map(|cell| typed_value(cell, column_type))
                .collect();
            Column::from_values(header, column_type, values)
        })
        .collect::<std::result::Result<Vec<_>, String>>()?;

    Ok(Table::from_columns(name.to_string(), columns)?)
}

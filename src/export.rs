/// Conversion of a table into downloadable CSV or XLSX bytes.
///
/// Everything is assembled in memory; the resulting `ConversionBuffer` is
/// handed to the caller and dropped once the response is sent.

use crate::column::ColumnValue;
use crate::error::{Result, SweepError};
use crate::table::Table;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

pub const CSV_MIME: &str = "text/csv";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Target format for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Excel,
}

impl OutputFormat {
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "CSV",
            OutputFormat::Excel => "Excel",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => ".csv",
            OutputFormat::Excel => ".xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Csv => CSV_MIME,
            OutputFormat::Excel => XLSX_MIME,
        }
    }
}

/// Re-encoded table ready to be offered as a download.
#[derive(Debug, Clone)]
pub struct ConversionBuffer {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Replace the trailing extension of `original` (case-insensitive) with the
/// target format's extension.
///
/// ```
/// use datasweeper::{output_file_name, OutputFormat};
///
/// assert_eq!(output_file_name("sales.xlsx", OutputFormat::Csv), "sales.csv");
/// assert_eq!(output_file_name("Q1.CSV", OutputFormat::Excel), "Q1.xlsx");
/// ```
pub fn output_file_name(original: &str, format: OutputFormat) -> String {
    let stem = match original.rfind('.') {
        Some(idx) if idx > 0 && !original[idx + 1..].contains(['/', '\\']) => &original[..idx],
        _ => original,
    };
    format!("{}{}", stem, format.extension())
}

/// Serialize `table` in the requested format.
pub fn convert(table: &Table, original_name: &str, format: OutputFormat) -> Result<ConversionBuffer> {
    if table.column_count() == 0 {
        return Err(SweepError::NoColumns);
    }
    let bytes = match format {
        OutputFormat::Csv => write_csv(table)?,
        OutputFormat::Excel => write_xlsx(table)?,
    };
    Ok(ConversionBuffer {
        file_name: output_file_name(original_name, format),
        mime_type: format.mime_type(),
        bytes,
    })
}

/// CSV text for a single value. Integral floats keep a trailing `.0`.
fn csv_field(value: &ColumnValue) -> String {
    match value {
        ColumnValue::Null => String::new(),
        ColumnValue::Int64(n) => n.to_string(),
        ColumnValue::Float64(f) => format!("{:?}", f),
        ColumnValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        ColumnValue::String(s) => s.clone(),
    }
}

/// Header plus data rows, minimal quoting, `\n` line endings, no index column.
pub fn write_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(table.schema().get_column_names())?;
    for row in table.iter_rows() {
        writer.write_record(row.iter().map(csv_field))?;
    }

    writer
        .into_inner()
        .map_err(|e| SweepError::Io(e.into_error()))
}

/// Single worksheet `Sheet1` with a bold header row. Missing cells stay blank.
pub fn write_xlsx(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (col_idx, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(col_idx).map_err(|_| {
            SweepError::Malformed(format!("Too many columns for a worksheet: {}", table.column_count()))
        })?;
        sheet.write_string_with_format(0, col, column.name(), &header_format)?;

        for (row_idx, value) in column.iter().enumerate() {
            let row = u32::try_from(row_idx + 1).map_err(|_| {
                SweepError::Malformed(format!("Too many rows for a worksheet: {}", table.len()))
            })?;
            match value {
                ColumnValue::Null => {}
                ColumnValue::Int64(n) => {
                    sheet.write_number(row, col, *n as f64)?;
                }
                ColumnValue::Float64(f) => {
                    sheet.write_number(row, col, *f)?;
                }
                ColumnValue::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                ColumnValue::String(s) => {
                    sheet.write_string(row, col, s)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

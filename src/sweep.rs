/// The sweep pipeline: parse an upload, preview it, clean it, narrow it to
/// the chosen columns and optionally chart it.
///
/// Every request re-runs the pipeline from the raw bytes, so the options of
/// one request never leak into another.

use crate::chart::{chart_outcome, ChartOutcome};
use crate::column::ColumnValue;
use crate::config::SweeperConfig;
use crate::error::{Result, SweepError};
use crate::export::{self, ConversionBuffer, OutputFormat};
use crate::ingest::read_table;
use crate::table::Table;
use crate::upload::{format_file_size, FileFormat, UploadedFile};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const DUPLICATES_REMOVED: &str = "Duplicates removed";
pub const MISSING_VALUES_FILLED: &str = "Missing values have been filled";

/// What to do with a file on this pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepOptions {
    pub remove_duplicates: bool,
    pub fill_missing: bool,
    /// Columns to keep, in order. `None` keeps every column.
    pub columns: Option<Vec<String>>,
    pub show_chart: bool,
}

/// Name and size of an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub extension: String,
    pub format: FileFormat,
}

/// First rows of a table, rendered as JSON values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl Preview {
    pub fn of(table: &Table, rows: usize) -> Self {
        Preview {
            columns: table
                .schema()
                .get_column_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            rows: table
                .head(rows)
                .iter()
                .map(|row| row.iter().map(ColumnValue::to_json).collect())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: &'static str,
    pub missing: usize,
}

/// Everything the UI shows for one file after a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub file: FileInfo,
    pub row_count: usize,
    pub available_columns: Vec<String>,
    pub selected_columns: Vec<String>,
    pub summary: Vec<ColumnSummary>,
    pub raw_preview: Preview,
    pub preview: Preview,
    pub duplicates_removed: usize,
    pub values_filled: usize,
    pub notices: Vec<String>,
    pub chart: ChartOutcome,
}

/// Result of a pass: the processed table plus its report.
#[derive(Debug, Clone)]
pub struct SweptFile {
    pub table: Table,
    pub report: SweepReport,
}

/// A file refused during upload, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub name: String,
    pub error: String,
}

/// Outcome of an upload batch. Accepted files keep their batch order.
#[derive(Debug, Default)]
pub struct UploadOutcome {
    pub accepted: Vec<(UploadedFile, FileInfo)>,
    pub rejected: Vec<Rejection>,
}

/// Runs the pipeline with the preview and chart limits from the config.
#[derive(Debug, Clone)]
pub struct Sweeper {
    preview_rows: usize,
    chart_row_limit: usize,
}

impl Default for Sweeper {
    fn default() -> Self {
        Sweeper::from_config(&SweeperConfig::default())
    }
}

impl Sweeper {
    pub fn new(preview_rows: usize, chart_row_limit: usize) -> Self {
        Sweeper {
            preview_rows,
            chart_row_limit,
        }
    }

    pub fn from_config(config: &SweeperConfig) -> Self {
        Sweeper::new(config.preview_rows, config.chart_row_limit)
    }

    /// Check the extension and that the file parses.
    pub fn inspect(&self, file: &UploadedFile) -> Result<FileInfo> {
        let info = file_info(file)?;
        read_table(file)?;
        Ok(info)
    }

    /// Inspect every file of a batch. A failing file is reported and skipped;
    /// the rest of the batch is still accepted.
    pub fn accept(&self, files: Vec<UploadedFile>) -> UploadOutcome {
        let mut outcome = UploadOutcome::default();
        for file in files {
            match self.inspect(&file) {
                Ok(info) => {
                    info!("Accepted {} ({})", info.name, info.size_label);
                    outcome.accepted.push((file, info));
                }
                Err(e) => {
                    warn!("Rejected {}: {}", file.name, e);
                    outcome.rejected.push(Rejection {
                        name: file.name,
                        error: e.to_string(),
                    });
                }
            }
        }
        outcome
    }

    /// Parse, preview, clean, select and chart one file.
    pub fn sweep(&self, file: &UploadedFile, options: &SweepOptions) -> Result<SweptFile> {
        let info = file_info(file)?;
        let mut table = read_table(file)?;

        let raw_preview = Preview::of(&table, self.preview_rows);
        let available_columns: Vec<String> = raw_preview.columns.clone();
        let mut notices = Vec::new();

        let duplicates_removed = if options.remove_duplicates {
            let removed = table.drop_duplicates();
            debug!("{}: removed {} duplicate rows", info.name, removed);
            notices.push(DUPLICATES_REMOVED.to_string());
            removed
        } else {
            0
        };

        let values_filled = if options.fill_missing {
            let filled = table.fill_missing_with_mean();
            debug!("{}: filled {} missing values", info.name, filled);
            notices.push(MISSING_VALUES_FILLED.to_string());
            filled
        } else {
            0
        };

        if let Some(columns) = &options.columns {
            select(&mut table, columns)?;
        }

        let chart = if options.show_chart {
            chart_outcome(&table, self.chart_row_limit)?
        } else {
            ChartOutcome::Hidden
        };
        if let ChartOutcome::NotEnoughNumericColumns { warning, .. } = &chart {
            notices.push(warning.clone());
        }

        let summary = table
            .columns()
            .iter()
            .map(|col| ColumnSummary {
                name: col.name().to_string(),
                dtype: col.column_type().label(),
                missing: col.null_count(),
            })
            .collect();

        let preview = Preview::of(&table, self.preview_rows);
        let report = SweepReport {
            file: info,
            row_count: table.len(),
            available_columns,
            selected_columns: preview.columns.clone(),
            summary,
            raw_preview,
            preview,
            duplicates_removed,
            values_filled,
            notices,
            chart,
        };

        Ok(SweptFile { table, report })
    }

    /// Run the cleaning and selection steps, then encode the result.
    pub fn convert(
        &self,
        file: &UploadedFile,
        options: &SweepOptions,
        format: OutputFormat,
    ) -> Result<ConversionBuffer> {
        let options = SweepOptions {
            show_chart: false,
            ..options.clone()
        };
        let swept = self.sweep(file, &options)?;
        let buffer = export::convert(&swept.table, &file.name, format)?;
        info!(
            "Converted {} to {} ({})",
            file.name,
            buffer.file_name,
            format_file_size(buffer.bytes.len() as u64)
        );
        Ok(buffer)
    }
}

fn file_info(file: &UploadedFile) -> Result<FileInfo> {
    let format = file.format()?;
    Ok(FileInfo {
        name: file.name.clone(),
        size: file.size(),
        size_label: format_file_size(file.size()),
        extension: file.extension(),
        format,
    })
}

fn select(table: &mut Table, columns: &[String]) -> Result<()> {
    if let Some(unknown) = columns
        .iter()
        .find(|name| table.schema().get_column_index(name).is_none())
    {
        return Err(SweepError::UnknownColumn(unknown.clone()));
    }
    table.select_columns(columns)?;
    Ok(())
}

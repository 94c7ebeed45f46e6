/// Data Sweeper - CSV/Excel Cleaning and Conversion
///
/// Reads uploaded CSV and XLSX files into a typed columnar table, removes
/// duplicate rows, fills missing numeric values with the column mean,
/// narrows the table to chosen columns, draws a quick bar chart and converts
/// the result to CSV or Excel entirely in memory.

pub mod column;
pub mod table;
pub mod error;
pub mod config;
pub mod upload;
pub mod ingest;
pub mod chart;
pub mod export;
pub mod sweep;

pub use column::{Column, ColumnType, ColumnValue};
pub use table::{Schema, Table};
pub use error::{Result, SweepError};
pub use config::SweeperConfig;
pub use upload::{format_file_size, FileFormat, UploadedFile};
pub use ingest::read_table;
pub use chart::{BarChartData, ChartOutcome};
pub use export::{output_file_name, ConversionBuffer, OutputFormat};
pub use sweep::{SweepOptions, SweepReport, Sweeper, SweptFile, UploadOutcome};

// HTTP server modules - only when server feature is enabled
#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod state;
#[cfg(feature = "server")]
pub mod server;

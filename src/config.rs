/// Runtime settings, read from the environment by the server binary.
use crate::error::{Result, SweepError};
use std::str::FromStr;

/// Settings for the server and the sweep pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SweeperConfig {
    pub host: String,
    pub port: u16,
    /// Rows shown in previews.
    pub preview_rows: usize,
    /// Largest accepted upload request, in bytes.
    pub max_upload_bytes: usize,
    /// Rows drawn in a bar chart.
    pub chart_row_limit: usize,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        SweeperConfig {
            host: "127.0.0.1".to_string(),
            port: 8501,
            preview_rows: 5,
            max_upload_bytes: 200 * 1024 * 1024,
            chart_row_limit: 1000,
        }
    }
}

impl SweeperConfig {
    /// Read `HOST`, `PORT`, `SWEEPER_PREVIEW_ROWS`, `SWEEPER_MAX_UPLOAD_MB`
    /// and `SWEEPER_CHART_ROWS`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SweeperConfig::default();
        let max_upload_mb: usize = parse_var(&lookup, "SWEEPER_MAX_UPLOAD_MB")?
            .unwrap_or(defaults.max_upload_bytes / (1024 * 1024));

        let config = SweeperConfig {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            preview_rows: parse_var(&lookup, "SWEEPER_PREVIEW_ROWS")?.unwrap_or(defaults.preview_rows),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            chart_row_limit: parse_var(&lookup, "SWEEPER_CHART_ROWS")?.unwrap_or(defaults.chart_row_limit),
        };

        if config.max_upload_bytes == 0 {
            return Err(SweepError::Config("SWEEPER_MAX_UPLOAD_MB must be positive".to_string()));
        }
        if config.chart_row_limit == 0 {
            return Err(SweepError::Config("SWEEPER_CHART_ROWS must be positive".to_string()));
        }
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SweepError::Config(format!("{} must be a number, got '{}'", key, raw))),
    }
}

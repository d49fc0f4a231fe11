use anyhow::{Context, Result};

use crate::series::MalformedValuePolicy;

/// Hard ceiling on rows per (job, query); caller-supplied limits are clamped
/// to the configured maximum, which itself cannot exceed this.
pub const MAX_SERIES_ROWS: i64 = 1000;

/// Values below the floor are sentinel fitnesses from divergent or failed
/// evaluations; clamping keeps them from distorting chart extents.
pub const DEFAULT_FITNESS_FLOOR: f64 = -99999.0;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_series_rows: i64,
    pub fitness_floor: f64,
    pub malformed_metric: MalformedValuePolicy,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env_optional_string("PROGRESS_DATABASE_URL")
            .context("PROGRESS_DATABASE_URL must be set to the optimization log store")?;
        let max_series_rows =
            env_i64("PROGRESS_MAX_SERIES_ROWS", MAX_SERIES_ROWS).clamp(1, MAX_SERIES_ROWS);
        let fitness_floor = env_f64("PROGRESS_FITNESS_FLOOR", DEFAULT_FITNESS_FLOOR);
        let malformed_metric = match env_optional_string("PROGRESS_MALFORMED_METRIC") {
            Some(raw) => MalformedValuePolicy::parse(&raw).with_context(|| {
                format!("PROGRESS_MALFORMED_METRIC must be 'zero' or 'drop', got '{raw}'")
            })?,
            None => MalformedValuePolicy::default(),
        };

        Ok(Self {
            database_url,
            max_series_rows,
            fitness_floor,
            malformed_metric,
        })
    }
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

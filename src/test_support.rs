use crate::config::{ServerConfig, DEFAULT_FITNESS_FLOOR, MAX_SERIES_ROWS};
use crate::db;
use crate::series::MalformedValuePolicy;
use crate::state::AppState;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        max_series_rows: MAX_SERIES_ROWS,
        fitness_floor: DEFAULT_FITNESS_FLOOR,
        malformed_metric: MalformedValuePolicy::Zero,
    }
}

/// State over a lazy pool that never connects; route tests must stay on
/// code paths that do not reach the store.
pub fn test_state() -> AppState {
    let config = test_config();
    let pool = db::connect_lazy(&config.database_url).expect("connect_lazy");
    AppState { config, db: pool }
}

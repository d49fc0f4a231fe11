use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::map_db_error;
use crate::family::AlgorithmFamily;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct SearchSummary {
    id: i64,
    name: String,
    current_iteration: i32,
    maximum_iterations: i32,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct FamilySearches {
    family: String,
    active: Vec<SearchSummary>,
    inactive: Vec<SearchSummary>,
}

#[derive(sqlx::FromRow)]
struct SearchRow {
    id: i32,
    name: String,
    current_iteration: i32,
    maximum_iterations: i32,
}

impl From<SearchRow> for SearchSummary {
    fn from(row: SearchRow) -> Self {
        Self {
            id: row.id as i64,
            name: row.name,
            current_iteration: row.current_iteration,
            maximum_iterations: row.maximum_iterations,
        }
    }
}

// A search with maximum_iterations = 0 runs until stopped externally, so it
// is listed as active alongside searches still below their iteration cap.
fn is_active(row: &SearchRow) -> bool {
    row.maximum_iterations == 0 || row.current_iteration < row.maximum_iterations
}

fn split_by_activity(rows: Vec<SearchRow>) -> (Vec<SearchSummary>, Vec<SearchSummary>) {
    let mut active = Vec::new();
    let mut inactive = Vec::new();
    for row in rows {
        if is_active(&row) {
            active.push(row.into());
        } else {
            inactive.push(row.into());
        }
    }
    (active, inactive)
}

#[utoipa::path(
    get,
    path = "/api/searches",
    tag = "searches",
    responses(
        (status = 200, description = "Jobs per algorithm family, split by activity", body = Vec<FamilySearches>),
        (status = 503, description = "Log store unavailable")
    )
)]
pub(crate) async fn list_searches(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<Vec<FamilySearches>>, (StatusCode, String)> {
    let mut out = Vec::with_capacity(AlgorithmFamily::ALL.len());
    for family in AlgorithmFamily::ALL {
        let sql = format!(
            "SELECT id, name, current_iteration, maximum_iterations FROM {} ORDER BY id ASC",
            family.job_table()
        );
        let rows: Vec<SearchRow> = sqlx::query_as(&sql)
            .fetch_all(&state.db)
            .await
            .map_err(map_db_error)?;
        let (active, inactive) = split_by_activity(rows);
        out.push(FamilySearches {
            family: family.name().to_string(),
            active,
            inactive,
        });
    }
    Ok(Json(out))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/searches", get(list_searches))
}

use axum::extract::RawQuery;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use url::form_urlencoded;

use crate::error::{is_store_unavailable, map_db_error};
use crate::series::{assemble, downsample, AssemblyOptions};
use crate::state::AppState;
use crate::{selection, store};

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct PlotSeries {
    name: String,
    /// `[evaluation, value]` pairs in append order.
    #[schema(value_type = Vec<Vec<f64>>)]
    data: Vec<(i64, f64)>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct PlotSeriesResponse {
    series: Vec<PlotSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y_max: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/api/plots/series",
    tag = "plots",
    params(
        ("first_evaluation" = Option<i64>, Query, description = "Lowest evaluation to include"),
        ("last_evaluation" = Option<i64>, Query, description = "Highest evaluation to include"),
        ("limit" = Option<i64>, Query, description = "Row cap per job; effective value is min(requested, server maximum)"),
        ("nth_value" = Option<i64>, Query, description = "Keep every Nth log row by append order (default 1)"),
        ("y_min" = Option<f64>, Query, description = "y-axis display hint, passed through unmodified"),
        ("y_max" = Option<f64>, Query, description = "y-axis display hint, passed through unmodified")
    ),
    responses(
        (status = 200, description = "Named fitness series for the selected jobs", body = PlotSeriesResponse),
        (status = 503, description = "Log store unavailable")
    )
)]
pub(crate) async fn plot_series(
    axum::extract::State(state): axum::extract::State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<PlotSeriesResponse>, (StatusCode, String)> {
    // Selection directives are free-form parameter names (`DE_3_fitness`),
    // so the query string is decoded as a raw pair list, not a typed struct.
    let params: Vec<(String, String)> = raw
        .map(|raw| {
            form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();
    let request = selection::parse_plot_request(
        params.iter().map(|(key, value)| (key.as_str(), value.as_str())),
        state.config.max_series_rows,
    );

    let assembly = AssemblyOptions {
        floor: state.config.fitness_floor,
        malformed: state.config.malformed_metric,
    };

    let mut series = Vec::new();
    for (family, job_id, fields) in request.selection.jobs() {
        let job_name = match store::resolve_job_name(&state.db, family, job_id).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::warn!(family = family.name(), job_id, "unknown job id in selection");
                continue;
            }
            Err(err) if is_store_unavailable(&err) => return Err(map_db_error(err)),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    family = family.name(),
                    job_id,
                    "job name lookup failed; skipping job"
                );
                continue;
            }
        };

        let rows = match store::read_log_rows(&state.db, family, job_id, fields, &request.sample)
            .await
        {
            Ok(rows) => rows,
            Err(err) if is_store_unavailable(&err) => return Err(map_db_error(err)),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    family = family.name(),
                    job_id,
                    "log read failed; skipping job"
                );
                continue;
            }
        };

        let rows = downsample(rows, request.sample.stride, request.sample.limit);
        series.extend(
            assemble(&job_name, fields, &rows, assembly)
                .into_iter()
                .map(|assembled| PlotSeries {
                    name: assembled.name,
                    data: assembled.points,
                }),
        );
    }

    Ok(Json(PlotSeriesResponse {
        series,
        y_min: request.hints.y_min,
        y_max: request.hints.y_max,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/plots/series", get(plot_series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn response_json(uri: &str) -> serde_json::Value {
        let app = Router::new()
            .route("/api/plots/series", get(plot_series))
            .with_state(crate::test_support::test_state());
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_selection_yields_empty_series_list() {
        let body = response_json("/api/plots/series").await;
        assert_eq!(body, serde_json::json!({ "series": [] }));
    }

    #[tokio::test]
    async fn unrecognized_directives_do_not_reach_the_store() {
        // Unknown family tags and malformed ids are dropped at parse time, so
        // the request completes without touching the (unreachable) test pool.
        let body =
            response_json("/api/plots/series?GA_1_fitness&DE_x_fitness&DE_2_bogus").await;
        assert_eq!(body, serde_json::json!({ "series": [] }));
    }

    #[tokio::test]
    async fn y_hints_are_echoed_without_touching_data() {
        let body = response_json("/api/plots/series?y_min=-5.5&y_max=12").await;
        assert_eq!(
            body,
            serde_json::json!({ "series": [], "y_min": -5.5, "y_max": 12.0 })
        );
    }

    #[test]
    fn points_serialize_as_evaluation_value_pairs() {
        let response = PlotSeriesResponse {
            series: vec![PlotSeries {
                name: "mw_nbody_1 fitness".to_string(),
                data: vec![(1, 10.0), (3, -99999.0)],
            }],
            y_min: None,
            y_max: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "series": [
                    { "name": "mw_nbody_1 fitness", "data": [[1, 10.0], [3, -99999.0]] }
                ]
            })
        );
    }
}

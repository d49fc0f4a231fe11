use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "search-progress-rs",
        description = "Down-sampled fitness-over-time series for parameter optimization searches"
    ),
    paths(
        routes::health::healthz_handler,
        routes::plots::plot_series,
        routes::searches::list_searches
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::plots::PlotSeries,
        routes::plots::PlotSeriesResponse,
        routes::searches::SearchSummary,
        routes::searches::FamilySearches
    )),
    tags(
        (name = "plots", description = "Metric series extraction and aggregation"),
        (name = "searches", description = "Per-family job directory")
    )
)]
struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub(crate) async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

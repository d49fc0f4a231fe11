use axum::http::StatusCode;

/// True when the error means the store itself is unreachable rather than a
/// single query failing. Unreachability is the one fatal condition of a plot
/// request; everything else degrades to fewer series.
pub fn is_store_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
    )
}

/// Maps a store error to a client response without leaking query text or
/// internal identifiers.
pub fn map_db_error(err: sqlx::Error) -> (StatusCode, String) {
    let status = if is_store_unavailable(&err) {
        StatusCode::SERVICE_UNAVAILABLE
    } else if matches!(err, sqlx::Error::RowNotFound) {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    tracing::error!(error = %err, status = %status, "database error");

    let message = match status {
        StatusCode::NOT_FOUND => "Resource not found",
        StatusCode::SERVICE_UNAVAILABLE => "Log store unavailable",
        _ => "Database error",
    };

    (status, message.to_string())
}

use sqlx::{PgPool, Row};

use crate::family::{AlgorithmFamily, MetricField};
use crate::selection::SampleOptions;
use crate::series::SampledRow;

/// Looks up a job's display name in its family's directory table. `None`
/// means the id does not exist (stale bookmark, mistyped id) and the job
/// must be skipped by the caller.
pub async fn resolve_job_name(
    db: &PgPool,
    family: AlgorithmFamily,
    job_id: i64,
) -> Result<Option<String>, sqlx::Error> {
    let sql = format!("SELECT name FROM {} WHERE id = $1", family.job_table());
    let row: Option<(String,)> = sqlx::query_as(&sql).bind(job_id).fetch_optional(db).await?;
    Ok(row.map(|(name,)| name))
}

/// Reads a job's log rows in append order, restricted to the family's base
/// predicate and the requested evaluation range, projected to the requested
/// metric fields. Fetches at most `fetch_window(limit, stride)` rows so the
/// positional downsample in `series::downsample` can fill `limit` points
/// without an unbounded read.
pub async fn read_log_rows(
    db: &PgPool,
    family: AlgorithmFamily,
    job_id: i64,
    fields: &[MetricField],
    sample: &SampleOptions,
) -> Result<Vec<SampledRow>, sqlx::Error> {
    let sql = sampled_log_sql(family, fields, sample);
    let mut query = sqlx::query(&sql).bind(job_id);
    if let Some(first) = sample.first_evaluation {
        query = query.bind(first);
    }
    if let Some(last) = sample.last_evaluation {
        query = query.bind(last);
    }
    query = query.bind(fetch_window(sample.limit, sample.stride));

    let rows = query.fetch_all(db).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let evaluation: i64 = row.try_get("evaluation")?;
        let values = fields
            .iter()
            // A value that fails float decoding is reported as missing and
            // resolved by the configured malformed-value policy.
            .map(|field| row.try_get::<Option<f64>, _>(field.column()).ok().flatten())
            .collect();
        out.push(SampledRow { evaluation, values });
    }
    Ok(out)
}

/// Rows needed ahead of downsampling: positions 0, N, …, (limit-1)·N.
fn fetch_window(limit: i64, stride: i64) -> i64 {
    let limit = limit.max(0);
    let stride = stride.max(1);
    if limit == 0 {
        return 0;
    }
    (limit - 1).saturating_mul(stride).saturating_add(1)
}

/// Builds the log query for one job. Table, predicate, and projected columns
/// all come from the closed `AlgorithmFamily` / `MetricField` sets, never
/// from request text; the id, range bounds, and row cap are bound
/// parameters.
fn sampled_log_sql(
    family: AlgorithmFamily,
    fields: &[MetricField],
    sample: &SampleOptions,
) -> String {
    let mut columns = String::from("evaluation::bigint AS evaluation");
    for field in fields {
        columns.push_str(", ");
        columns.push_str(field.column());
    }

    let mut sql = format!(
        "SELECT {columns} FROM {} WHERE search_id = $1",
        family.log_table()
    );
    if let Some(predicate) = family.log_predicate() {
        sql.push_str(" AND ");
        sql.push_str(predicate);
    }

    let mut bind = 2;
    if sample.first_evaluation.is_some() {
        sql.push_str(&format!(" AND evaluation >= ${bind}"));
        bind += 1;
    }
    if sample.last_evaluation.is_some() {
        sql.push_str(&format!(" AND evaluation <= ${bind}"));
        bind += 1;
    }
    sql.push_str(&format!(" ORDER BY id ASC LIMIT ${bind}"));
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(first: Option<i64>, last: Option<i64>) -> SampleOptions {
        SampleOptions {
            first_evaluation: first,
            last_evaluation: last,
            limit: 1000,
            stride: 1,
        }
    }

    #[test]
    fn query_projects_requested_fields_only() {
        let sql = sampled_log_sql(
            AlgorithmFamily::DifferentialEvolution,
            &[MetricField::Fitness, MetricField::Best],
            &sample(None, None),
        );
        assert_eq!(
            sql,
            "SELECT evaluation::bigint AS evaluation, fitness, best \
             FROM differential_evolution_log WHERE search_id = $1 \
             ORDER BY id ASC LIMIT $2"
        );
    }

    #[test]
    fn particle_swarm_query_keeps_only_global_best_rows() {
        let sql = sampled_log_sql(
            AlgorithmFamily::ParticleSwarm,
            &[MetricField::Fitness],
            &sample(None, None),
        );
        assert_eq!(
            sql,
            "SELECT evaluation::bigint AS evaluation, fitness \
             FROM particle_swarm_log WHERE search_id = $1 AND global \
             ORDER BY id ASC LIMIT $2"
        );
    }

    #[test]
    fn range_bounds_shift_bind_positions() {
        let sql = sampled_log_sql(
            AlgorithmFamily::AsynchronousNewton,
            &[MetricField::Fitness],
            &sample(Some(10), Some(500)),
        );
        assert_eq!(
            sql,
            "SELECT evaluation::bigint AS evaluation, fitness \
             FROM asynchronous_newton_method_log WHERE search_id = $1 \
             AND evaluation >= $2 AND evaluation <= $3 \
             ORDER BY id ASC LIMIT $4"
        );

        let sql = sampled_log_sql(
            AlgorithmFamily::AsynchronousNewton,
            &[MetricField::Fitness],
            &sample(None, Some(500)),
        );
        assert_eq!(
            sql,
            "SELECT evaluation::bigint AS evaluation, fitness \
             FROM asynchronous_newton_method_log WHERE search_id = $1 \
             AND evaluation <= $2 \
             ORDER BY id ASC LIMIT $3"
        );
    }

    #[test]
    fn fetch_window_covers_the_last_sampled_position() {
        assert_eq!(fetch_window(1000, 1), 1000);
        assert_eq!(fetch_window(5, 2), 9);
        assert_eq!(fetch_window(1, 100), 1);
        assert_eq!(fetch_window(3, 10), 21);
        assert_eq!(fetch_window(0, 10), 0);
        assert_eq!(fetch_window(i64::MAX, i64::MAX), i64::MAX);
    }
}

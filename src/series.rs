use crate::family::MetricField;

/// One log row projected to the requested metric fields. `values` is aligned
/// with the field slice the row was read for; `None` marks a value that was
/// missing or failed numeric conversion in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledRow {
    pub evaluation: i64,
    pub values: Vec<Option<f64>>,
}

/// A named, ordered point sequence ready for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(i64, f64)>,
}

/// What to do with a log value that is missing or not numeric. The store
/// historically coerced these to zero; `Drop` omits the point instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedValuePolicy {
    #[default]
    Zero,
    Drop,
}

impl MalformedValuePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "zero" => Some(MalformedValuePolicy::Zero),
            "drop" => Some(MalformedValuePolicy::Drop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssemblyOptions {
    /// Values below this are replaced by it, so divergent or failed
    /// evaluations cannot stretch the chart's value range.
    pub floor: f64,
    pub malformed: MalformedValuePolicy,
}

/// Keeps every `stride`th row by append position (positions 0, N, 2N, …) and
/// truncates to `limit` rows. Positional, not evaluation-spaced: stride 1
/// keeps every row even when evaluation counters are non-contiguous.
pub fn downsample(rows: Vec<SampledRow>, stride: i64, limit: i64) -> Vec<SampledRow> {
    let stride = stride.max(1) as usize;
    let limit = limit.max(0) as usize;
    rows.into_iter()
        .enumerate()
        .filter(|(position, _)| position % stride == 0)
        .map(|(_, row)| row)
        .take(limit)
        .collect()
}

pub fn clamp_floor(value: f64, floor: f64) -> f64 {
    if value < floor {
        floor
    } else {
        value
    }
}

/// Builds one series per requested field from a job's sampled rows. A job
/// with no rows contributes no series at all, not empty placeholders.
pub fn assemble(
    job_name: &str,
    fields: &[MetricField],
    rows: &[SampledRow],
    options: AssemblyOptions,
) -> Vec<Series> {
    if rows.is_empty() {
        return Vec::new();
    }

    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let points = rows
                .iter()
                .filter_map(|row| {
                    let value = match row.values.get(index).copied().flatten() {
                        Some(value) => value,
                        None => match options.malformed {
                            MalformedValuePolicy::Zero => 0.0,
                            MalformedValuePolicy::Drop => return None,
                        },
                    };
                    Some((row.evaluation, clamp_floor(value, options.floor)))
                })
                .collect();
            Series {
                name: format!("{} {}", job_name, field.column()),
                points,
            }
        })
        .collect()
}

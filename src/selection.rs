use std::collections::BTreeMap;

use crate::family::{AlgorithmFamily, MetricField};

/// The parsed selection of a plot request: which metric fields to chart for
/// which jobs, grouped per algorithm family. Families iterate in declaration
/// order, jobs in ascending id order, fields in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct MetricSelection {
    groups: BTreeMap<AlgorithmFamily, BTreeMap<i64, Vec<MetricField>>>,
}

impl MetricSelection {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn add(&mut self, family: AlgorithmFamily, job_id: i64, field: MetricField) {
        let fields = self
            .groups
            .entry(family)
            .or_default()
            .entry(job_id)
            .or_default();
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    /// One entry per selected job, in output order.
    pub fn jobs<'a>(
        &'a self,
    ) -> impl Iterator<Item = (AlgorithmFamily, i64, &'a [MetricField])> + 'a {
        self.groups.iter().flat_map(|(family, jobs)| {
            jobs.iter()
                .map(|(job_id, fields)| (*family, *job_id, fields.as_slice()))
        })
    }

    pub fn field_pair_count(&self) -> usize {
        self.jobs().map(|(_, _, fields)| fields.len()).sum()
    }
}

/// Evaluation-range, row-cap, and stride options of a plot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOptions {
    pub first_evaluation: Option<i64>,
    pub last_evaluation: Option<i64>,
    /// Effective row cap, already clamped to the server maximum.
    pub limit: i64,
    /// Keep every Nth row by append order; 1 keeps every row.
    pub stride: i64,
}

/// Requested y-axis bounds. Display hints only: forwarded to the charting
/// front end, never applied to the data.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayHints {
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct PlotRequest {
    pub selection: MetricSelection,
    pub sample: SampleOptions,
    pub hints: DisplayHints,
}

/// Decodes the flat query parameters of a plot request.
///
/// Selection directives are parameter names of exactly three underscore
/// separated tokens, `<FAMILY_TAG>_<job_id>_<metric_field>`; the value is
/// ignored, presence is the signal. Anything that does not parse as a
/// directive (unknown family tag, non-numeric or negative job id, metric
/// field outside the family's allow-list, wrong token count) is skipped
/// rather than failing the request, so stale bookmarked selections degrade
/// to fewer series instead of an error.
pub fn parse_plot_request<'a, I>(params: I, max_rows: i64) -> PlotRequest
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut selection = MetricSelection::default();
    let mut sample = SampleOptions {
        first_evaluation: None,
        last_evaluation: None,
        limit: max_rows,
        stride: 1,
    };
    let mut hints = DisplayHints::default();

    for (key, value) in params {
        match key {
            "first_evaluation" => sample.first_evaluation = parse_i64(value),
            "last_evaluation" => sample.last_evaluation = parse_i64(value),
            "limit" => {
                if let Some(requested) = parse_i64(value).filter(|v| *v > 0) {
                    sample.limit = requested.min(max_rows);
                }
            }
            "nth_value" => {
                if let Some(stride) = parse_i64(value).filter(|v| *v > 0) {
                    sample.stride = stride;
                }
            }
            "y_min" => hints.y_min = parse_f64(value),
            "y_max" => hints.y_max = parse_f64(value),
            _ => {
                if let Some((family, job_id, field)) = parse_directive(key) {
                    selection.add(family, job_id, field);
                } else {
                    tracing::debug!(key, "ignoring non-directive parameter");
                }
            }
        }
    }

    PlotRequest {
        selection,
        sample,
        hints,
    }
}

fn parse_directive(key: &str) -> Option<(AlgorithmFamily, i64, MetricField)> {
    let mut tokens = key.split('_');
    let (tag, id, field) = (tokens.next()?, tokens.next()?, tokens.next()?);
    if tokens.next().is_some() {
        return None;
    }
    let family = AlgorithmFamily::from_tag(tag)?;
    let job_id = id.parse::<i64>().ok().filter(|id| *id >= 0)?;
    let field = family.parse_metric_field(field)?;
    Some((family, job_id, field))
}

fn parse_i64(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

fn parse_f64(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_ROWS: i64 = 1000;

    fn parse(params: &[(&str, &str)]) -> PlotRequest {
        parse_plot_request(params.iter().copied(), MAX_ROWS)
    }

    #[test]
    fn groups_directives_by_family_and_job() {
        let request = parse(&[
            ("PSO_7_best", ""),
            ("DE_3_fitness", ""),
            ("DE_3_average", ""),
            ("DE_12_fitness", ""),
        ]);

        let jobs: Vec<_> = request.selection.jobs().collect();
        assert_eq!(jobs.len(), 3);
        assert_eq!(
            jobs[0],
            (
                AlgorithmFamily::DifferentialEvolution,
                3,
                &[MetricField::Fitness, MetricField::Average][..]
            )
        );
        assert_eq!(
            jobs[1],
            (
                AlgorithmFamily::DifferentialEvolution,
                12,
                &[MetricField::Fitness][..]
            )
        );
        assert_eq!(
            jobs[2],
            (AlgorithmFamily::ParticleSwarm, 7, &[MetricField::Best][..])
        );
    }

    #[test]
    fn duplicate_fields_collapse() {
        let request = parse(&[("DE_3_fitness", ""), ("DE_3_fitness", "1")]);
        assert_eq!(request.selection.field_pair_count(), 1);
    }

    #[test]
    fn malformed_directives_are_skipped_not_fatal() {
        let request = parse(&[
            ("GA_3_fitness", ""),        // unknown family tag
            ("DE_abc_fitness", ""),      // non-numeric id
            ("DE_-4_fitness", ""),       // negative id
            ("DE_3_parameters", ""),     // field outside the allow-list
            ("DE_3_local_best", ""),     // four tokens
            ("DE_3", ""),                // two tokens
            ("generate_plots", ""),      // unrelated form field
            ("PSO_2_fitness", ""),
        ]);

        let jobs: Vec<_> = request.selection.jobs().collect();
        assert_eq!(
            jobs,
            vec![(
                AlgorithmFamily::ParticleSwarm,
                2,
                &[MetricField::Fitness][..]
            )]
        );
    }

    #[test]
    fn empty_selection_is_valid() {
        let request = parse(&[("limit", "50"), ("y_min", "-10")]);
        assert!(request.selection.is_empty());
        assert_eq!(request.selection.field_pair_count(), 0);
    }

    #[test]
    fn sample_options_default_and_clamp() {
        let request = parse(&[]);
        assert_eq!(
            request.sample,
            SampleOptions {
                first_evaluation: None,
                last_evaluation: None,
                limit: MAX_ROWS,
                stride: 1,
            }
        );

        let request = parse(&[
            ("first_evaluation", "100"),
            ("last_evaluation", "5000"),
            ("limit", "200"),
            ("nth_value", "10"),
        ]);
        assert_eq!(request.sample.first_evaluation, Some(100));
        assert_eq!(request.sample.last_evaluation, Some(5000));
        assert_eq!(request.sample.limit, 200);
        assert_eq!(request.sample.stride, 10);
    }

    #[test]
    fn limit_is_capped_server_side() {
        let request = parse(&[("limit", "5000")]);
        assert_eq!(request.sample.limit, MAX_ROWS);
    }

    #[test]
    fn non_positive_limit_and_stride_fall_back_to_defaults() {
        let request = parse(&[("limit", "0"), ("nth_value", "-3")]);
        assert_eq!(request.sample.limit, MAX_ROWS);
        assert_eq!(request.sample.stride, 1);

        let request = parse(&[("limit", "abc"), ("nth_value", "x")]);
        assert_eq!(request.sample.limit, MAX_ROWS);
        assert_eq!(request.sample.stride, 1);
    }

    #[test]
    fn y_hints_pass_through() {
        let request = parse(&[("y_min", "-250.5"), ("y_max", "10")]);
        assert_eq!(request.hints.y_min, Some(-250.5));
        assert_eq!(request.hints.y_max, Some(10.0));

        let request = parse(&[("y_min", "nan"), ("y_max", "")]);
        assert_eq!(request.hints.y_min, None);
        assert_eq!(request.hints.y_max, None);
    }
}

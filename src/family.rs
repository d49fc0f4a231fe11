/// The optimization algorithm families the progress store tracks. Each family
/// owns one job-directory table and one append-only `<table>_log` table.
///
/// The enum order is the presentation order of the series response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlgorithmFamily {
    DifferentialEvolution,
    ParticleSwarm,
    AsynchronousNewton,
}

impl AlgorithmFamily {
    pub const ALL: [AlgorithmFamily; 3] = [
        AlgorithmFamily::DifferentialEvolution,
        AlgorithmFamily::ParticleSwarm,
        AlgorithmFamily::AsynchronousNewton,
    ];

    /// Short code used in selection parameter names (`DE_3_fitness`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "DE" => Some(AlgorithmFamily::DifferentialEvolution),
            "PSO" => Some(AlgorithmFamily::ParticleSwarm),
            "ANM" => Some(AlgorithmFamily::AsynchronousNewton),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            AlgorithmFamily::DifferentialEvolution => "DE",
            AlgorithmFamily::ParticleSwarm => "PSO",
            AlgorithmFamily::AsynchronousNewton => "ANM",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmFamily::DifferentialEvolution => "differential_evolution",
            AlgorithmFamily::ParticleSwarm => "particle_swarm",
            AlgorithmFamily::AsynchronousNewton => "asynchronous_newton_method",
        }
    }

    pub fn job_table(&self) -> &'static str {
        self.name()
    }

    pub fn log_table(&self) -> &'static str {
        match self {
            AlgorithmFamily::DifferentialEvolution => "differential_evolution_log",
            AlgorithmFamily::ParticleSwarm => "particle_swarm_log",
            AlgorithmFamily::AsynchronousNewton => "asynchronous_newton_method_log",
        }
    }

    /// Extra SQL predicate restricting which log rows represent the search's
    /// progress. Particle swarm logs one row per particle report; only rows
    /// flagged `global` carry the swarm best-so-far value.
    pub fn log_predicate(&self) -> Option<&'static str> {
        match self {
            AlgorithmFamily::ParticleSwarm => Some("global"),
            _ => None,
        }
    }

    /// Metric fields callers may select for this family. Unknown field names
    /// in a request are rejected at parse time and never reach a query.
    pub fn metric_fields(&self) -> &'static [MetricField] {
        static FIELDS: [MetricField; 6] = [
            MetricField::Fitness,
            MetricField::Current,
            MetricField::Best,
            MetricField::Average,
            MetricField::Median,
            MetricField::Worst,
        ];
        &FIELDS
    }

    pub fn parse_metric_field(&self, name: &str) -> Option<MetricField> {
        self.metric_fields()
            .iter()
            .copied()
            .find(|field| field.column() == name)
    }
}

/// A typed accessor for one numeric column of a family's log table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricField {
    Fitness,
    Current,
    Best,
    Average,
    Median,
    Worst,
}

impl MetricField {
    pub fn column(&self) -> &'static str {
        match self {
            MetricField::Fitness => "fitness",
            MetricField::Current => "current",
            MetricField::Best => "best",
            MetricField::Average => "average",
            MetricField::Median => "median",
            MetricField::Worst => "worst",
        }
    }
}

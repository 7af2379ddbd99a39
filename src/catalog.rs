use std::fmt;

use crate::{
    error::Result,
    extract::{Extractor, NumberPatterns},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Mcvi,
    AoStar,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Mcvi, Algorithm::AoStar];

    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Mcvi => "MCVI",
            Algorithm::AoStar => "AO*",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal state of a simulated trial. Exactly one per trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    CompletedProblem,
    ExitedPolicy,
    MaxIterations,
    NoSolutionOnPolicy,
    NoSolutionExitedPolicy,
}

impl Outcome {
    pub const ALL: [Outcome; 5] = [
        Outcome::CompletedProblem,
        Outcome::ExitedPolicy,
        Outcome::MaxIterations,
        Outcome::NoSolutionOnPolicy,
        Outcome::NoSolutionExitedPolicy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Outcome::CompletedProblem => "completed problem",
            Outcome::ExitedPolicy => "exited policy",
            Outcome::MaxIterations => "max iterations",
            Outcome::NoSolutionOnPolicy => "no solution (on policy)",
            Outcome::NoSolutionExitedPolicy => "no solution (exited policy)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Count,
    AverageReward,
    HighestReward,
    LowestReward,
    RewardVariance,
}

impl Statistic {
    pub const ALL: [Statistic; 5] = [
        Statistic::Count,
        Statistic::AverageReward,
        Statistic::HighestReward,
        Statistic::LowestReward,
        Statistic::RewardVariance,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Statistic::Count => "Count",
            Statistic::AverageReward => "Average reward",
            Statistic::HighestReward => "Highest reward",
            Statistic::LowestReward => "Lowest reward",
            Statistic::RewardVariance => "Reward variance",
        }
    }

    fn extractor(self) -> Extractor {
        match self {
            Statistic::Count => Extractor::Int,
            _ => Extractor::Float,
        }
    }
}

/// Every value the scanner can pull out of a solver's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Runtime(Algorithm),
    StateSpaceSize,
    ObservationSpaceSize,
    InitialBeliefSize,
    McviIterations,
    PolicyNodes(Algorithm),
    Outcome(Algorithm, Outcome, Statistic),
}

impl Metric {
    /// Result table column the metric is written to.
    pub fn column(self) -> String {
        match self {
            Metric::Runtime(alg) => format!("{} runtime (s)", alg),
            Metric::StateSpaceSize => "State space size".to_string(),
            Metric::ObservationSpaceSize => "Observation space size".to_string(),
            Metric::InitialBeliefSize => "Initial belief size".to_string(),
            Metric::McviIterations => "MCVI iterations".to_string(),
            Metric::PolicyNodes(alg) => format!("{} policy nodes", alg),
            Metric::Outcome(alg, outcome, stat) => outcome_label(alg, outcome, stat),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column())
    }
}

fn outcome_label(alg: Algorithm, outcome: Outcome, stat: Statistic) -> String {
    format!("{} {} {}", alg.label(), outcome.label(), stat.label())
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub label: String,
    pub metric: Metric,
    pub extractor: Extractor,
}

/// Ordered label -> metric table. When two labels match the same line the
/// later entry is stored last.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<Pattern>,
    numbers: NumberPatterns,
}

impl PatternCatalog {
    pub fn new(patterns: Vec<Pattern>) -> Result<Self> {
        Ok(PatternCatalog {
            patterns,
            numbers: NumberPatterns::new()?,
        })
    }

    /// The catalog matching the CTP experiment binaries' output.
    pub fn standard() -> Result<Self> {
        let mut patterns = vec![
            pattern("AO* complete ", Metric::Runtime(Algorithm::AoStar), Extractor::Float),
            pattern("MCVI complete ", Metric::Runtime(Algorithm::Mcvi), Extractor::Float),
            pattern("State space size:", Metric::StateSpaceSize, Extractor::Int),
            pattern("Observation space size:", Metric::ObservationSpaceSize, Extractor::Int),
            pattern("Initial belief size:", Metric::InitialBeliefSize, Extractor::Int),
            pattern("--- Iter ", Metric::McviIterations, Extractor::Iteration),
            pattern(
                "MCVI policy FSC contains",
                Metric::PolicyNodes(Algorithm::Mcvi),
                Extractor::Int,
            ),
            pattern(
                "AO* greedy policy tree contains",
                Metric::PolicyNodes(Algorithm::AoStar),
                Extractor::Int,
            ),
        ];
        for alg in Algorithm::ALL {
            for outcome in Outcome::ALL {
                for stat in Statistic::ALL {
                    patterns.push(Pattern {
                        label: outcome_label(alg, outcome, stat),
                        metric: Metric::Outcome(alg, outcome, stat),
                        extractor: stat.extractor(),
                    });
                }
            }
        }
        PatternCatalog::new(patterns)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn numbers(&self) -> &NumberPatterns {
        &self.numbers
    }

    /// Metrics in catalog order, each listed once.
    pub fn metrics(&self) -> Vec<Metric> {
        let mut metrics: Vec<Metric> = Vec::with_capacity(self.patterns.len());
        for p in &self.patterns {
            if !metrics.contains(&p.metric) {
                metrics.push(p.metric);
            }
        }
        metrics
    }
}

fn pattern(label: &str, metric: Metric, extractor: Extractor) -> Pattern {
    Pattern {
        label: label.to_string(),
        metric,
        extractor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_layout() {
        let catalog = PatternCatalog::standard().unwrap();
        assert_eq!(catalog.patterns().len(), 8 + 2 * 5 * 5);
        assert_eq!(catalog.patterns()[0].label, "AO* complete ");
        assert_eq!(catalog.patterns()[5].extractor, Extractor::Iteration);
        assert_eq!(catalog.metrics().len(), catalog.patterns().len());
    }

    #[test]
    fn composite_labels() {
        let catalog = PatternCatalog::standard().unwrap();
        let p = catalog
            .patterns()
            .iter()
            .find(|p| {
                p.metric
                    == Metric::Outcome(
                        Algorithm::AoStar,
                        Outcome::NoSolutionExitedPolicy,
                        Statistic::RewardVariance,
                    )
            })
            .unwrap();
        assert_eq!(p.label, "AO* no solution (exited policy) Reward variance");
        assert_eq!(p.extractor, Extractor::Float);
        assert_eq!(
            Metric::Outcome(Algorithm::Mcvi, Outcome::CompletedProblem, Statistic::Count).column(),
            "MCVI completed problem Count"
        );
    }

    #[test]
    fn column_names() {
        assert_eq!(Metric::Runtime(Algorithm::AoStar).column(), "AO* runtime (s)");
        assert_eq!(Metric::PolicyNodes(Algorithm::Mcvi).column(), "MCVI policy nodes");
        assert_eq!(Metric::McviIterations.column(), "MCVI iterations");
    }
}

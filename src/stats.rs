use std::collections::BTreeMap;

use crate::{
    catalog::{Algorithm, Metric, Outcome},
    derive::percentage_column,
    record::{RunRecord, AVG_REWARD_DIFFERENCE, NODES, POLICY_SIZE_RATIO, RUNTIME_RATIO},
};

/// Means over all harvested runs of one problem size.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeSummary {
    pub nodes: usize,
    pub runs: usize,
    pub mcvi_runtime: Option<f64>,
    pub ao_star_runtime: Option<f64>,
    pub mcvi_completed: Option<f64>,
    pub ao_star_completed: Option<f64>,
    pub runtime_ratio: Option<f64>,
    pub policy_size_ratio: Option<f64>,
    pub avg_reward_difference: Option<f64>,
}

/// Mean of the column over `records`, ignoring NaN and absent cells.
pub fn mean(records: &[&RunRecord], column: &str) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get_f64(column))
        .filter(|v| !v.is_nan())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Groups rows by node count, smallest first. Rows without a node count are
/// left out.
pub fn summarize(records: &[RunRecord]) -> Vec<SizeSummary> {
    let mut by_size: BTreeMap<usize, Vec<&RunRecord>> = BTreeMap::new();
    for record in records {
        if let Some(nodes) = record.get_f64(NODES) {
            by_size.entry(nodes as usize).or_default().push(record);
        }
    }

    by_size
        .into_iter()
        .map(|(nodes, rows)| SizeSummary {
            nodes,
            runs: rows.len(),
            mcvi_runtime: mean(&rows, &Metric::Runtime(Algorithm::Mcvi).column()),
            ao_star_runtime: mean(&rows, &Metric::Runtime(Algorithm::AoStar).column()),
            mcvi_completed: mean(
                &rows,
                &percentage_column(Algorithm::Mcvi, Outcome::CompletedProblem),
            ),
            ao_star_completed: mean(
                &rows,
                &percentage_column(Algorithm::AoStar, Outcome::CompletedProblem),
            ),
            runtime_ratio: mean(&rows, RUNTIME_RATIO),
            policy_size_ratio: mean(&rows, POLICY_SIZE_RATIO),
            avg_reward_difference: mean(&rows, AVG_REWARD_DIFFERENCE),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RunIdentity, Scalar};

    fn row(nodes: usize, trial: usize, ratio: f64, mcvi_runtime: f64) -> RunRecord {
        let mut record = RunRecord::new(RunIdentity {
            nodes,
            trial,
            seed: trial as u64,
        });
        record.set(RUNTIME_RATIO, Scalar::Float(ratio));
        record.set("MCVI runtime (s)", Scalar::Float(mcvi_runtime));
        record
    }

    #[test]
    fn groups_by_size() {
        let records = vec![
            row(10, 0, 2.0, 4.0),
            row(5, 0, 1.0, 1.0),
            row(10, 1, 4.0, 6.0),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].nodes, 5);
        assert_eq!(summary[1].runs, 2);
        assert_eq!(summary[1].runtime_ratio, Some(3.0));
        assert_eq!(summary[1].mcvi_runtime, Some(5.0));
        assert_eq!(summary[1].policy_size_ratio, None);
    }

    #[test]
    fn nan_cells_are_ignored() {
        let records = vec![row(7, 0, f64::NAN, 1.0), row(7, 1, 0.5, 1.0)];
        assert_eq!(summarize(&records)[0].runtime_ratio, Some(0.5));
    }
}

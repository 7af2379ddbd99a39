use crate::{
    catalog::{Algorithm, Metric, Outcome, PatternCatalog, Statistic},
    error::{Error, Result},
    record::{
        RunIdentity, RunRecord, Scalar, AVG_REWARD_DIFFERENCE, PERCENTAGE_COMPLETE_DIFFERENCE,
        POLICY_SIZE_RATIO, RUNTIME_RATIO,
    },
    scan::Scan,
};

/// Metrics the derived columns are computed from.
pub fn required_metrics() -> Vec<Metric> {
    let mut metrics = Vec::new();
    for alg in Algorithm::ALL {
        for outcome in Outcome::ALL {
            metrics.push(Metric::Outcome(alg, outcome, Statistic::Count));
        }
    }
    for alg in Algorithm::ALL {
        metrics.push(Metric::Outcome(
            alg,
            Outcome::CompletedProblem,
            Statistic::AverageReward,
        ));
        metrics.push(Metric::PolicyNodes(alg));
        metrics.push(Metric::Runtime(alg));
    }
    metrics
}

pub fn percentage_column(alg: Algorithm, outcome: Outcome) -> String {
    format!("{} {} Percentage", alg.label(), outcome.label())
}

/// Columns added by `derive`, in the order they are written.
pub fn derived_columns() -> Vec<String> {
    let mut columns = Vec::new();
    for alg in Algorithm::ALL {
        for outcome in Outcome::ALL {
            columns.push(percentage_column(alg, outcome));
        }
    }
    columns.extend(
        [
            AVG_REWARD_DIFFERENCE,
            PERCENTAGE_COMPLETE_DIFFERENCE,
            POLICY_SIZE_RATIO,
            RUNTIME_RATIO,
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    columns
}

/// Total trials of `alg` over all outcomes.
pub fn trial_count(scan: &Scan, alg: Algorithm) -> Result<f64> {
    let mut total = 0.0;
    for outcome in Outcome::ALL {
        total += scan.require_f64(Metric::Outcome(alg, outcome, Statistic::Count))?;
    }
    Ok(total)
}

/// Share of `alg`'s trials that ended in `outcome`, in percent.
pub fn percentage(scan: &Scan, alg: Algorithm, outcome: Outcome) -> Result<f64> {
    let total = trial_count(scan, alg)?;
    if total == 0.0 {
        return Err(Error::NoTrials { algorithm: alg });
    }
    let count = scan.require_f64(Metric::Outcome(alg, outcome, Statistic::Count))?;
    Ok(count / total * 100.0)
}

/// Builds the result row: identity, every scanned metric, then the derived
/// percentages and the MCVI vs AO* comparisons.
pub fn derive(identity: RunIdentity, scan: &Scan, catalog: &PatternCatalog) -> Result<RunRecord> {
    scan.require_all(&required_metrics())?;

    let mut record = RunRecord::new(identity);
    for metric in catalog.metrics() {
        if let Some(value) = scan.get(metric) {
            record.set(&metric.column(), value.clone());
        }
    }

    for alg in Algorithm::ALL {
        for outcome in Outcome::ALL {
            let value = percentage(scan, alg, outcome)?;
            record.set(&percentage_column(alg, outcome), Scalar::Float(value));
        }
    }

    let average_reward = |alg| {
        scan.require_f64(Metric::Outcome(
            alg,
            Outcome::CompletedProblem,
            Statistic::AverageReward,
        ))
    };
    let completed = |alg| percentage(scan, alg, Outcome::CompletedProblem);

    let avg_reward_difference = average_reward(Algorithm::Mcvi)? - average_reward(Algorithm::AoStar)?;
    let percentage_complete_difference = completed(Algorithm::Mcvi)? - completed(Algorithm::AoStar)?;
    let policy_size_ratio = scan.require_f64(Metric::PolicyNodes(Algorithm::Mcvi))?
        / scan.require_f64(Metric::PolicyNodes(Algorithm::AoStar))?;
    let runtime_ratio = scan.require_f64(Metric::Runtime(Algorithm::Mcvi))?
        / scan.require_f64(Metric::Runtime(Algorithm::AoStar))?;

    record.set(AVG_REWARD_DIFFERENCE, Scalar::Float(avg_reward_difference));
    record.set(
        PERCENTAGE_COMPLETE_DIFFERENCE,
        Scalar::Float(percentage_complete_difference),
    );
    record.set(POLICY_SIZE_RATIO, Scalar::Float(policy_size_ratio));
    record.set(RUNTIME_RATIO, Scalar::Float(runtime_ratio));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: RunIdentity = RunIdentity {
        nodes: 10,
        trial: 1,
        seed: 4242,
    };

    /// A scan with every required metric; MCVI completes 60% of 10 trials,
    /// AO* 50% of 10.
    fn complete_scan() -> Scan {
        let mut scan = Scan::default();
        let counts = [
            (Algorithm::Mcvi, [6, 1, 2, 1, 0]),
            (Algorithm::AoStar, [5, 0, 0, 3, 2]),
        ];
        for (alg, values) in counts {
            for (outcome, count) in Outcome::ALL.iter().zip(values) {
                scan.insert(
                    Metric::Outcome(alg, *outcome, Statistic::Count),
                    Scalar::Int(count),
                );
            }
        }
        scan.insert(
            Metric::Outcome(Algorithm::Mcvi, Outcome::CompletedProblem, Statistic::AverageReward),
            Scalar::Float(10.0),
        );
        scan.insert(
            Metric::Outcome(Algorithm::AoStar, Outcome::CompletedProblem, Statistic::AverageReward),
            Scalar::Float(8.0),
        );
        scan.insert(Metric::PolicyNodes(Algorithm::Mcvi), Scalar::Int(100));
        scan.insert(Metric::PolicyNodes(Algorithm::AoStar), Scalar::Int(25));
        scan.insert(Metric::Runtime(Algorithm::Mcvi), Scalar::Float(0.0));
        scan.insert(Metric::Runtime(Algorithm::AoStar), Scalar::Float(5.0));
        scan
    }

    fn derive_standard(scan: &Scan) -> Result<RunRecord> {
        derive(IDENTITY, scan, &PatternCatalog::standard().unwrap())
    }

    #[test]
    fn comparison_fields() {
        let record = derive_standard(&complete_scan()).unwrap();
        assert_eq!(record.get_f64("MCVI completed problem Percentage"), Some(60.0));
        assert_eq!(record.get_f64("AO* completed problem Percentage"), Some(50.0));
        assert_eq!(record.get_f64(AVG_REWARD_DIFFERENCE), Some(2.0));
        assert_eq!(record.get_f64(PERCENTAGE_COMPLETE_DIFFERENCE), Some(10.0));
        assert_eq!(record.get_f64(POLICY_SIZE_RATIO), Some(4.0));
        assert_eq!(record.get_f64(RUNTIME_RATIO), Some(0.0));
    }

    #[test]
    fn percentages_sum_to_hundred() {
        let scan = complete_scan();
        for alg in Algorithm::ALL {
            assert_eq!(trial_count(&scan, alg).unwrap(), 10.0);
            let sum: f64 = Outcome::ALL
                .iter()
                .map(|o| percentage(&scan, alg, *o).unwrap())
                .sum();
            assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_denominators_propagate() {
        let mut scan = complete_scan();
        scan.insert(Metric::Runtime(Algorithm::Mcvi), Scalar::Float(5.0));
        scan.insert(Metric::Runtime(Algorithm::AoStar), Scalar::Float(0.0));
        scan.insert(Metric::PolicyNodes(Algorithm::Mcvi), Scalar::Int(0));
        scan.insert(Metric::PolicyNodes(Algorithm::AoStar), Scalar::Int(0));
        let record = derive_standard(&scan).unwrap();
        assert_eq!(record.get_f64(RUNTIME_RATIO), Some(f64::INFINITY));
        assert!(record.get_f64(POLICY_SIZE_RATIO).unwrap().is_nan());
    }

    #[test]
    fn zero_trials_is_an_error() {
        let mut scan = complete_scan();
        for outcome in Outcome::ALL {
            scan.insert(
                Metric::Outcome(Algorithm::AoStar, outcome, Statistic::Count),
                Scalar::Int(0),
            );
        }
        match derive_standard(&scan) {
            Err(Error::NoTrials { algorithm }) => assert_eq!(algorithm, Algorithm::AoStar),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_metrics_are_listed_together() {
        let mut scan = Scan::default();
        for (metric, value) in [
            (Metric::PolicyNodes(Algorithm::AoStar), Scalar::Int(3)),
            (Metric::Runtime(Algorithm::Mcvi), Scalar::Float(1.0)),
        ] {
            scan.insert(metric, value);
        }
        match derive_standard(&scan) {
            Err(Error::MissingMetrics(missing)) => {
                assert_eq!(missing.len(), required_metrics().len() - 2);
                assert!(missing.contains(&"MCVI policy nodes".to_string()));
                assert!(!missing.contains(&"AO* policy nodes".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn scanned_metrics_are_copied_in_catalog_order() {
        let mut scan = complete_scan();
        scan.insert(Metric::StateSpaceSize, Scalar::Int(64));
        let record = derive_standard(&scan).unwrap();
        let columns: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(
            &columns[..6],
            &[
                "Nodes",
                "Trial",
                "Seed",
                "AO* runtime (s)",
                "MCVI runtime (s)",
                "State space size"
            ]
        );
        assert_eq!(columns.last(), Some(&RUNTIME_RATIO));
        assert_eq!(record.get("Observation space size"), None);
    }
}

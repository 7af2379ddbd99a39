use tracing::info;

use crate::{
    catalog::PatternCatalog,
    config::{ExperimentConfig, Mode},
    derive::derive,
    error::Result,
    provision::{
        next_seed, write_instance, write_snapshot, FanGraphs, GraphSet, Instance, InstanceSource,
        RandomGraphs,
    },
    record::{RunIdentity, RunRecord, Scalar, OUTPUT_FILE, WALL_TIME},
    runner::{self, RunOutcome},
    scan::scan_file,
    table::{self, schema, ResultsTable},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub harvested: usize,
    pub failed: usize,
    pub timed_out: usize,
}

/// Per-batch state: the catalog, the growing results file and every row so
/// far for the final dump.
struct Batch<'a> {
    config: &'a ExperimentConfig,
    catalog: PatternCatalog,
    columns: Vec<String>,
    table: ResultsTable,
    records: Vec<RunRecord>,
    summary: BatchSummary,
}

impl<'a> Batch<'a> {
    fn new(config: &'a ExperimentConfig) -> Result<Self> {
        let catalog = PatternCatalog::standard()?;
        let columns = schema(&catalog);
        let table = ResultsTable::create(config.results_file(), columns.clone())?;
        Ok(Batch {
            config,
            catalog,
            columns,
            table,
            records: Vec::new(),
            summary: BatchSummary::default(),
        })
    }

    /// Provisions, builds, runs and harvests one cell. Returns whether a row
    /// was added.
    fn run_cell(&mut self, identity: RunIdentity, instance: &Instance) -> Result<bool> {
        let config = self.config;
        write_instance(&config.graph_file, instance)?;
        runner::build(config)?;

        let args = runner::solver_args(config.mode, identity.nodes);
        let (output, wall_time) =
            match runner::run_instance(config, identity.nodes, identity.trial, &args)? {
                RunOutcome::Completed { output, wall_time } => (output, wall_time),
                RunOutcome::Failed { .. } => {
                    self.summary.failed += 1;
                    return Ok(false);
                }
                RunOutcome::TimedOut { .. } => {
                    self.summary.timed_out += 1;
                    return Ok(false);
                }
            };

        let scan = scan_file(&output, &self.catalog)?;
        let mut record = derive(identity, &scan, &self.catalog)?;
        let file_name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        record.set(OUTPUT_FILE, Scalar::Str(file_name));
        record.set(WALL_TIME, Scalar::Float(wall_time.as_secs_f64()));

        self.table.append(&record)?;
        self.records.push(record);
        self.summary.harvested += 1;
        info!(
            nodes = identity.nodes,
            trial = identity.trial,
            seed = identity.seed,
            "harvested run"
        );
        Ok(true)
    }

    fn finish(self) -> Result<BatchSummary> {
        info!(
            rows = self.table.rows(),
            file = %self.config.results_file().display(),
            "closing results file"
        );
        table::write_all(self.config.results_file_all(), &self.columns, &self.records)?;
        Ok(self.summary)
    }
}

/// Runs the whole batch described by `config`, one cell after another.
pub fn run(config: &ExperimentConfig) -> Result<BatchSummary> {
    config.validate()?;
    runner::initialise(config)?;
    let mut batch = Batch::new(config)?;

    match config.mode {
        Mode::Random => {
            let mut source = RandomGraphs::new(config.generator.clone(), config.max_seed_attempts)?;
            sweep(&mut batch, &mut source)?;
        }
        Mode::Fan => sweep(&mut batch, &mut FanGraphs)?,
        Mode::Set => {
            let mut source = RandomGraphs::new(config.generator.clone(), config.max_seed_attempts)?;
            let set = GraphSet::draw(
                &mut source,
                config.set_problem_size,
                config.set_size,
                config.seed,
            )?;
            write_snapshot(config.snapshot_file(), set.instances())?;
            for (trial, instance) in set.instances().iter().enumerate() {
                println!("Progress: {}/{}", trial + 1, set.len());
                let identity = RunIdentity {
                    nodes: instance.nodes,
                    trial,
                    seed: instance.seed,
                };
                batch.run_cell(identity, instance)?;
            }
        }
    }

    let summary = batch.finish()?;
    info!(
        harvested = summary.harvested,
        failed = summary.failed,
        timed_out = summary.timed_out,
        "batch complete"
    );
    Ok(summary)
}

/// Every size times every repetition. The seed moves past each harvested
/// instance so the next cell gets a fresh graph.
fn sweep<S: InstanceSource>(batch: &mut Batch<'_>, source: &mut S) -> Result<()> {
    let config = batch.config;
    let total = config.problem_sizes.len() * config.repetitions;
    let mut seed = config.seed;
    let mut done = 0;
    for &nodes in &config.problem_sizes {
        for trial in 0..config.repetitions {
            done += 1;
            println!("Progress: {}/{}", done, total);
            let instance = source.next_instance(nodes, seed)?;
            seed = instance.seed;
            let identity = RunIdentity {
                nodes,
                trial,
                seed,
            };
            if batch.run_cell(identity, &instance)? {
                seed = next_seed(seed)?;
            }
        }
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::{fs, path::Path, time::Duration};

    use super::*;
    use crate::{error::Error, provision::read_snapshot, record::RUNTIME_RATIO, table::read_records};

    const SOLVER_OUTPUT: &str = "\
State space size: 320
Observation space size: 40
Initial belief size: 8
--- Iter 0 ---
--- Iter 1 ---
MCVI complete 4.0
MCVI policy FSC contains 30 nodes
AO* complete 2.0
AO* greedy policy tree contains 10 nodes
MCVI completed problem Count: 8
MCVI completed problem Average reward: -4.5
MCVI exited policy Count: 1
MCVI max iterations Count: 1
MCVI no solution (on policy) Count: 0
MCVI no solution (exited policy) Count: 0
AO* completed problem Count: 10
AO* completed problem Average reward: -5
AO* exited policy Count: 0
AO* max iterations Count: 0
AO* no solution (on policy) Count: 0
AO* no solution (exited policy) Count: 0
";

    fn script(dir: &Path, name: &str, body: &str) -> Vec<String> {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        vec!["sh".to_string(), path.to_string_lossy().into_owned()]
    }

    fn config(dir: &Path, mode: Mode) -> ExperimentConfig {
        fs::write(dir.join("output.txt"), SOLVER_OUTPUT).unwrap();
        let mut config = ExperimentConfig::new(mode, 40);
        config.problem_sizes = vec![5, 6];
        config.repetitions = 1;
        config.results_dir = dir.join("results");
        config.graph_file = dir.join("experiments/CTP/auto_generated_graph.h");
        config.build_dir = dir.to_path_buf();
        config.configure_command.clear();
        config.build_command = vec!["true".to_string()];
        config.timeout = Duration::from_secs(20);
        // the 6-node budget makes the solver fail
        config.solver = script(
            dir,
            "solver.sh",
            &format!(
                "if [ \"$2\" = \"16000\" ]; then exit 1; fi\ncat '{}'\n",
                dir.join("output.txt").display()
            ),
        );
        config.generator = script(dir, "gen.sh", "echo \"graph $2 $4\"\n");
        config
    }

    #[test]
    fn fan_batch_skips_failed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Mode::Fan);
        let summary = run(&config).unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                harvested: 1,
                failed: 1,
                timed_out: 0
            }
        );

        let rows = read_records(config.results_file()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(read_records(config.results_file_all()).unwrap(), rows);
        let row = &rows[0];
        assert_eq!(row.get("Nodes"), Some(&Scalar::Int(5)));
        assert_eq!(row.get("Seed"), Some(&Scalar::Int(40)));
        assert_eq!(row.get("MCVI iterations"), Some(&Scalar::Int(2)));
        assert_eq!(row.get_f64("MCVI completed problem Percentage"), Some(80.0));
        assert_eq!(row.get_f64("percentage_complete_difference"), Some(-20.0));
        assert_eq!(row.get_f64("avg_reward_difference"), Some(0.5));
        assert_eq!(row.get_f64("policy_size_ratio"), Some(3.0));
        assert_eq!(row.get_f64(RUNTIME_RATIO), Some(2.0));
        assert_eq!(
            row.get("Output file"),
            Some(&Scalar::Str("CTPInstance_5_0.txt".to_string()))
        );

        let archived = fs::read_to_string(config.output_file(5, 0)).unwrap();
        assert!(archived.ends_with(&FanGraphs::describe(5)));
    }

    #[test]
    fn random_batch_advances_seed_only_after_harvest() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), Mode::Random);
        config.problem_sizes = vec![5, 6, 7];
        config.seed = 41;
        config.generator = script(
            dir.path(),
            "even.sh",
            "seed=$4\n\
             if [ $((seed % 2)) -ne 0 ]; then exit 3; fi\n\
             echo \"graph $2 $seed\"\n",
        );
        let summary = run(&config).unwrap();
        assert_eq!(summary.harvested, 2);
        assert_eq!(summary.failed, 1);

        // 41 is rejected so size 5 runs on 42; size 6 fails on 44, which
        // size 7 then reuses
        let rows = read_records(config.results_file_all()).unwrap();
        let cells: Vec<(Option<f64>, Option<&Scalar>)> = rows
            .iter()
            .map(|r| (r.get_f64("Nodes"), r.get("Seed")))
            .collect();
        assert_eq!(
            cells,
            vec![
                (Some(5.0), Some(&Scalar::Int(42))),
                (Some(7.0), Some(&Scalar::Int(44))),
            ]
        );
        let graph = fs::read_to_string(&config.graph_file).unwrap();
        assert!(graph.contains("graph 7 44"));
    }

    #[test]
    fn set_batch_snapshots_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), Mode::Set);
        config.set_problem_size = 15;
        config.set_size = 3;
        let summary = run(&config).unwrap();
        assert_eq!(summary.harvested, 3);

        let snapshot = read_snapshot(config.snapshot_file()).unwrap();
        let seeds: Vec<u64> = snapshot.iter().map(|i| i.seed).collect();
        assert_eq!(seeds, vec![40, 41, 42]);
        assert_eq!(snapshot[2].description, "graph 15 42\n");

        let rows = read_records(config.results_file_all()).unwrap();
        let trials: Vec<Option<f64>> = rows.iter().map(|r| r.get_f64("Trial")).collect();
        assert_eq!(trials, vec![Some(0.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn missing_labels_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), Mode::Fan);
        config.solver = script(dir.path(), "quiet.sh", "echo 'Initialising CTP'\n");
        match run(&config) {
            Err(Error::MissingMetrics(missing)) => {
                assert!(missing.contains(&"MCVI policy nodes".to_string()))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn build_failure_aborts_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), Mode::Fan);
        config.build_command = vec!["false".to_string()];
        assert!(matches!(run(&config), Err(Error::BuildFailed { .. })));
    }
}

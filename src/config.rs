use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use chrono::Local;

use crate::{
    cli::CliArgs,
    error::{Error, Result},
};

/// Where the instances of a batch come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A solvable random graph per size and repetition.
    Random,
    /// The fan graph with one stochastic edge per extra node.
    Fan,
    /// A fixed set of instances of one size, drawn before the batch starts.
    Set,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(Mode::Random),
            "fan" => Ok(Mode::Fan),
            "set" => Ok(Mode::Set),
            otherwise => Err(Error::InvalidConfig(format!(
                "{} is not a valid mode.",
                otherwise
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Random => "random",
            Mode::Fan => "fan",
            Mode::Set => "set",
        })
    }
}

const HOUR: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub mode: Mode,
    /// Node counts of the random and fan modes, in run order.
    pub problem_sizes: Vec<usize>,
    pub repetitions: usize,
    pub set_size: usize,
    pub set_problem_size: usize,
    pub seed: u64,
    pub results_dir: PathBuf,
    /// Overwritten before every run and read by the solver build.
    pub graph_file: PathBuf,
    pub build_dir: PathBuf,
    /// Run in `build_dir` once before the batch. Empty to skip.
    pub configure_command: Vec<String>,
    /// Run in `build_dir` before every solver run.
    pub build_command: Vec<String>,
    /// Solver program and leading arguments.
    pub solver: Vec<String>,
    /// Instance generator program and leading arguments.
    pub generator: Vec<String>,
    pub timeout: Duration,
    pub max_seed_attempts: u32,
}

impl ExperimentConfig {
    /// Defaults for `mode`, rooted in the current directory.
    pub fn new(mode: Mode, seed: u64) -> Self {
        let (solver, timeout) = match mode {
            Mode::Set => ("build/experiments/CTP/ctp_timeseries", 10 * HOUR),
            _ => ("build/experiments/CTP/ctp_experiment", 50 * HOUR),
        };
        let set_size = 10;
        let set_problem_size = 15;
        ExperimentConfig {
            mode,
            problem_sizes: default_sizes(),
            repetitions: 5,
            set_size,
            set_problem_size,
            seed,
            results_dir: default_results_dir(mode, set_problem_size, set_size),
            graph_file: PathBuf::from("experiments/CTP/auto_generated_graph.h"),
            build_dir: PathBuf::from("build"),
            configure_command: vec!["cmake".to_string(), "..".to_string()],
            build_command: vec!["make".to_string()],
            solver: vec![solver.to_string()],
            generator: vec!["ctp_generator".to_string()],
            timeout: Duration::from_secs(timeout),
            max_seed_attempts: 1000,
        }
    }

    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mode: Mode = args.mode.parse()?;
        let seed = args.seed.unwrap_or_else(|| rand::random::<u64>() % 10_000_000);
        let mut config = ExperimentConfig::new(mode, seed);

        if let Some(sizes) = &args.sizes {
            config.problem_sizes = parse_sizes(sizes)?;
        }
        config.repetitions = args.repetitions;
        config.set_size = args.set_size;
        config.set_problem_size = args.problem_size;
        config.results_dir = match &args.results_dir {
            Some(dir) => PathBuf::from(dir),
            None => default_results_dir(mode, config.set_problem_size, config.set_size),
        };
        config.graph_file = PathBuf::from(&args.graph_file);
        config.build_dir = PathBuf::from(&args.build_dir);
        if let Some(solver) = &args.solver {
            config.solver = split_command(solver);
        }
        config.generator = split_command(&args.generator);
        if let Some(secs) = args.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config.max_seed_attempts = args.max_seed_attempts;
        if args.skip_configure {
            config.configure_command.clear();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mode == Mode::Set && self.set_size == 0 {
            return Err(Error::InvalidConfig("set size must be positive".to_string()));
        }
        if self.mode != Mode::Set && (self.problem_sizes.is_empty() || self.repetitions == 0) {
            return Err(Error::InvalidConfig(
                "at least one problem size and repetition is required".to_string(),
            ));
        }
        if self.build_command.is_empty() || self.solver.is_empty() {
            return Err(Error::InvalidConfig(
                "build and solver commands must not be empty".to_string(),
            ));
        }
        if self.mode != Mode::Fan && self.generator.is_empty() {
            return Err(Error::InvalidConfig("generator command is empty".to_string()));
        }
        if i64::try_from(self.seed).is_err() {
            return Err(Error::InvalidConfig(format!(
                "seed {} is larger than {}",
                self.seed,
                i64::MAX
            )));
        }
        if self.max_seed_attempts == 0 {
            return Err(Error::InvalidConfig(
                "max seed attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Incrementally written result file.
    pub fn results_file(&self) -> PathBuf {
        match self.mode {
            Mode::Set => self.results_dir.join("ctp_results.csv"),
            mode => self.results_dir.join(format!("ctp_results_{}.csv", mode)),
        }
    }

    /// Full-batch dump written at the end.
    pub fn results_file_all(&self) -> PathBuf {
        match self.mode {
            Mode::Set => self.results_dir.join("ctp_results_all.csv"),
            mode => self.results_dir.join(format!("ctp_results_{}_all.csv", mode)),
        }
    }

    pub fn snapshot_file(&self) -> PathBuf {
        self.results_dir.join("problem_graphs.json")
    }

    pub fn output_file(&self, nodes: usize, trial: usize) -> PathBuf {
        self.results_dir
            .join(format!("CTPInstance_{}_{}.txt", nodes, trial))
    }
}

/// 5 to 20 nodes one by one, then 25 to 50 in steps of 5.
pub fn default_sizes() -> Vec<usize> {
    (5..=20).chain((25..=50).step_by(5)).collect()
}

/// Runtime budget handed to the solver for an instance of `nodes` nodes.
pub fn runtime_budget(nodes: usize) -> i64 {
    let n = nodes as i64;
    (n * n - 20) * 1000
}

fn default_results_dir(mode: Mode, problem_size: usize, set_size: usize) -> PathBuf {
    let timestr = Local::now().format("%Y-%m-%d_%H-%M");
    match mode {
        Mode::Set => PathBuf::from(format!(
            "eval_results_{}x{}_{}",
            problem_size, set_size, timestr
        )),
        mode => PathBuf::from(format!("eval_results_{}_{}", mode, timestr)),
    }
}

fn split_command(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Parses `5-20,25,30` into `[5, 6, ..., 20, 25, 30]`.
pub fn parse_sizes(text: &str) -> Result<Vec<usize>> {
    let invalid = |part: &str| Error::InvalidConfig(format!("invalid problem size {:?}", part));
    let mut sizes = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((from, to)) => {
                let from: usize = from.trim().parse().map_err(|_| invalid(part))?;
                let to: usize = to.trim().parse().map_err(|_| invalid(part))?;
                if from > to {
                    return Err(invalid(part));
                }
                sizes.extend(from..=to);
            }
            None => sizes.push(part.parse().map_err(|_| invalid(part))?),
        }
    }
    if sizes.is_empty() {
        return Err(invalid(text));
    }
    Ok(sizes)
}

use clap::{command, Arg, ArgAction, ArgMatches, Command};

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub mode: String,
    pub sizes: Option<String>,
    pub repetitions: usize,
    pub set_size: usize,
    pub problem_size: usize,
    pub seed: Option<u64>,
    pub results_dir: Option<String>,
    pub graph_file: String,
    pub build_dir: String,
    pub solver: Option<String>,
    pub generator: String,
    pub timeout_secs: Option<u64>,
    pub max_seed_attempts: u32,
    pub skip_configure: bool,
}

pub fn command() -> Command {
    command!("ctp_eval")
        .about("Runs MCVI and AO* on generated CTP instances and tabulates the results.")
        .arg(
            Arg::new("mode")
                .help("Instance mode: random, fan or set")
                .default_value("random")
                .index(1),
        )
        .arg(
            Arg::new("sizes")
                .help("Problem sizes, e.g. 5-20,25,30 (random and fan modes)")
                .long("sizes")
                .short('n'),
        )
        .arg(
            Arg::new("repetitions")
                .help("Runs per problem size")
                .long("repetitions")
                .short('r')
                .value_parser(clap::value_parser!(usize))
                .default_value("5"),
        )
        .arg(
            Arg::new("set_size")
                .help("Number of instances in the precomputed set (set mode)")
                .long("set-size")
                .value_parser(clap::value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            Arg::new("problem_size")
                .help("Nodes per instance in the precomputed set (set mode)")
                .long("problem-size")
                .value_parser(clap::value_parser!(usize))
                .default_value("15"),
        )
        .arg(
            Arg::new("seed")
                .help("Starting seed; drawn at random when omitted")
                .long("seed")
                .short('s')
                .value_parser(clap::value_parser!(u64).range(..=i64::MAX as u64)),
        )
        .arg(
            Arg::new("results")
                .help("Results folder; timestamped name when omitted")
                .long("results")
                .short('o'),
        )
        .arg(
            Arg::new("graph_file")
                .help("Instance file consumed by the solver build")
                .long("graph-file")
                .default_value("experiments/CTP/auto_generated_graph.h"),
        )
        .arg(
            Arg::new("build_dir")
                .help("Build directory of the solver")
                .long("build-dir")
                .default_value("build"),
        )
        .arg(
            Arg::new("solver")
                .help("Solver binary; defaults to the experiment binary for the mode")
                .long("solver"),
        )
        .arg(
            Arg::new("generator")
                .help("Instance generator command (random and set modes)")
                .long("generator")
                .short('g')
                .default_value("ctp_generator"),
        )
        .arg(
            Arg::new("timeout")
                .help("Wall-clock limit per solver run in seconds")
                .long("timeout")
                .short('t')
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("max_seed_attempts")
                .help("Seeds tried before giving up on a solvable random instance")
                .long("max-seed-attempts")
                .value_parser(clap::value_parser!(u32))
                .default_value("1000"),
        )
        .arg(
            Arg::new("skip_configure")
                .help("Do not run cmake before the batch")
                .long("skip-configure")
                .action(ArgAction::SetTrue),
        )
}

pub fn cli() -> CliArgs {
    from_matches(&command().get_matches())
}

pub fn from_matches(arguments: &ArgMatches) -> CliArgs {
    let string = |id: &str| arguments.get_one::<String>(id).cloned();

    CliArgs {
        mode: string("mode").unwrap_or_else(|| "random".to_string()),
        sizes: string("sizes"),
        repetitions: arguments.get_one::<usize>("repetitions").copied().unwrap_or(5),
        set_size: arguments.get_one::<usize>("set_size").copied().unwrap_or(10),
        problem_size: arguments.get_one::<usize>("problem_size").copied().unwrap_or(15),
        seed: arguments.get_one::<u64>("seed").copied(),
        results_dir: string("results"),
        graph_file: string("graph_file")
            .unwrap_or_else(|| "experiments/CTP/auto_generated_graph.h".to_string()),
        build_dir: string("build_dir").unwrap_or_else(|| "build".to_string()),
        solver: string("solver"),
        generator: string("generator").unwrap_or_else(|| "ctp_generator".to_string()),
        timeout_secs: arguments.get_one::<u64>("timeout").copied(),
        max_seed_attempts: arguments
            .get_one::<u32>("max_seed_attempts")
            .copied()
            .unwrap_or(1000),
        skip_configure: arguments.get_flag("skip_configure"),
    }
}

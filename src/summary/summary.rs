use std::{
    error::Error,
    io::{self, Write},
    path::PathBuf,
};

use ctp_eval::{provision::read_snapshot, stats::summarize, table::read_records};
use glob::glob;

/*
Summarise the full-batch result files: per problem size, how many runs were
harvested and how MCVI compares to AO* on average.
Pass result files as arguments, otherwise every `eval_results_*` folder is used.
*/

fn main() -> Result<(), Box<dyn Error>> {
    let mut paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        for entry in glob("eval_results_*/ctp_results*_all.csv")? {
            paths.push(entry?);
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in &paths {
        let records = read_records(path)?;
        writeln!(out, "Results: {}", path.display())?;
        writeln!(out, "Runs: {}", records.len())?;
        // set batches keep their instances next to the results
        if let Some(snapshot) = path
            .parent()
            .map(|dir| dir.join("problem_graphs.json"))
            .filter(|snapshot| snapshot.exists())
        {
            let instances = read_snapshot(&snapshot)?;
            let seeds: Vec<String> = instances.iter().map(|i| i.seed.to_string()).collect();
            writeln!(out, "Instances: {} (seeds {})", instances.len(), seeds.join(", "))?;
        }
        for size in summarize(&records) {
            writeln!(
                out,
                "Nodes: {:>3}, Runs: {}, MCVI completed: {}%, AO* completed: {}%, Runtime ratio: {}, Policy size ratio: {}, Reward difference: {}",
                size.nodes,
                size.runs,
                fmt(size.mcvi_completed),
                fmt(size.ao_star_completed),
                fmt(size.runtime_ratio),
                fmt(size.policy_size_ratio),
                fmt(size.avg_reward_difference),
            )?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn fmt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

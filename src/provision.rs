use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
    process::Command,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Exit status with which the generator reports an unsolvable graph.
pub const UNSOLVABLE_EXIT_CODE: i32 = 3;

/// One problem graph, in the textual form the solver build compiles in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub nodes: usize,
    /// Seed that produced the graph; may be past the one asked for.
    pub seed: u64,
    pub description: String,
}

/// The seed after `seed`; seeds are stored as signed CSV integers, so the
/// sequence ends at `i64::MAX`.
pub fn next_seed(seed: u64) -> Result<u64> {
    seed.checked_add(1)
        .filter(|next| *next <= i64::MAX as u64)
        .ok_or_else(|| Error::InvalidConfig(format!("seed {} cannot be advanced", seed)))
}

pub trait InstanceSource {
    fn next_instance(&mut self, nodes: usize, seed: u64) -> Result<Instance>;
}

/// Random graphs from the external generator, retried with the next seed
/// until one is solvable.
pub struct RandomGraphs {
    /// Program followed by its leading arguments.
    generator: Vec<String>,
    max_attempts: u32,
}

impl RandomGraphs {
    pub fn new(generator: Vec<String>, max_attempts: u32) -> Result<Self> {
        if generator.is_empty() {
            return Err(Error::InvalidConfig("generator command is empty".to_string()));
        }
        Ok(RandomGraphs {
            generator,
            max_attempts,
        })
    }

    fn generate(&self, nodes: usize, seed: u64) -> Result<Option<String>> {
        debug!(generator = ?self.generator, nodes, seed, "generating graph");
        let output = Command::new(&self.generator[0])
            .args(&self.generator[1..])
            .args(["--nodes", &nodes.to_string(), "--seed", &seed.to_string()])
            .output()?;
        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned())),
            Some(UNSOLVABLE_EXIT_CODE) => Ok(None),
            code => Err(Error::Generator {
                code,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        }
    }
}

impl InstanceSource for RandomGraphs {
    fn next_instance(&mut self, nodes: usize, seed: u64) -> Result<Instance> {
        let mut current = seed;
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                current = next_seed(current)?;
            }
            if let Some(description) = self.generate(nodes, current)? {
                return Ok(Instance {
                    nodes,
                    seed: current,
                    description,
                });
            }
        }
        Err(Error::Unsolvable {
            nodes,
            seed,
            attempts: self.max_attempts,
        })
    }
}

const FAN_PREAMBLE: &str = "#pragma once

#include <cstdint>
#include <unordered_map>
#include <utility>
#include <vector>

#include \"pairhash.h\"
";

const FAN_BODY: &str = "
const int64_t CTPOrigin = 0;
const int64_t CTPGoal = 2;
std::vector<int64_t> CTPNodes = {0, 1, 2};
std::unordered_map<std::pair<int64_t, int64_t>, double, pairhash> CTPEdges = {
    {{0, 1}, 1}};
std::unordered_map<std::pair<int64_t, int64_t>, double, pairhash> CTPStochEdges;
struct CTPDataInitializer {
  CTPDataInitializer() {
    double prob_prod = 1.0;
    const double k = 2.0 / (NUM_FAN_EDGES_CTP + 1);
    for (int64_t i = 1; i < NUM_FAN_EDGES_CTP; ++i) {
      const int64_t node = 2 + i;
      CTPNodes.push_back(node);
      const double p = 1 - 1.0 / (NUM_FAN_EDGES_CTP * prob_prod);
      prob_prod *= p;
      CTPEdges[{1, node}] = k * i;
      CTPEdges[{2, node}] = 1.0;
      CTPStochEdges[{1, node}] = p;
    }
    CTPEdges[{1, 2 + NUM_FAN_EDGES_CTP}] = k * NUM_FAN_EDGES_CTP;
    CTPEdges[{2, 2 + NUM_FAN_EDGES_CTP}] = 1.0;
    CTPNodes.push_back(2 + NUM_FAN_EDGES_CTP);
  }
};
static CTPDataInitializer ctpDataInitializer;
";

/// The fan graph: origin 0 reaches hub 1, which fans out over `nodes`
/// edges (all but the last stochastic) towards goal 2.
#[derive(Debug, Default)]
pub struct FanGraphs;

impl FanGraphs {
    pub fn describe(edges: usize) -> String {
        format!(
            "{}#define NUM_FAN_EDGES_CTP {}\n{}",
            FAN_PREAMBLE, edges, FAN_BODY
        )
    }
}

impl InstanceSource for FanGraphs {
    fn next_instance(&mut self, nodes: usize, seed: u64) -> Result<Instance> {
        Ok(Instance {
            nodes,
            seed,
            description: FanGraphs::describe(nodes),
        })
    }
}

/// A fixed batch of instances of one size, drawn up front.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSet {
    instances: Vec<Instance>,
}

impl GraphSet {
    /// Draws `size` instances with consecutive seeds from `source`.
    pub fn draw<S: InstanceSource>(source: &mut S, nodes: usize, size: usize, seed: u64) -> Result<Self> {
        let mut instances = Vec::with_capacity(size);
        let mut from = seed;
        for _ in 0..size {
            let instance = source.next_instance(nodes, from)?;
            from = next_seed(instance.seed)?;
            instances.push(instance);
        }
        info!(nodes, size, "drew instance set");
        Ok(GraphSet { instances })
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Overwrites the instance file the solver build reads.
pub fn write_instance<P: AsRef<Path>>(path: P, instance: &Instance) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, &instance.description)?;
    Ok(())
}

pub fn write_snapshot<P: AsRef<Path>>(path: P, instances: &[Instance]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, instances)?;
    Ok(())
}

pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Vec<Instance>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

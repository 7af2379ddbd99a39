use thiserror::Error;

use crate::catalog::Algorithm;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Configure or build step exited with a non-zero status.
    #[error("{step} failed with returncode {code:?}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    BuildFailed {
        step: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Instance generator failed with returncode {code:?}: {stderr}")]
    Generator { code: Option<i32>, stderr: String },

    #[error("No solvable instance with {nodes} nodes after {attempts} seeds starting at {seed}")]
    Unsolvable {
        nodes: usize,
        seed: u64,
        attempts: u32,
    },

    #[error("No {kind} found in line {line:?}")]
    NoNumber { kind: &'static str, line: String },

    #[error("Invalid {kind} {text:?} in line {line:?}")]
    InvalidNumber {
        kind: &'static str,
        text: String,
        line: String,
    },

    #[error("Missing metrics in solver output: {}", .0.join(", "))]
    MissingMetrics(Vec<String>),

    #[error("{algorithm} has no recorded trials")]
    NoTrials { algorithm: Algorithm },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

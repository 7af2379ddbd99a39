use std::fmt;

/// A single cell of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Reads a cell written by `Display` back, preferring the narrowest type.
    pub fn parse_cell(text: &str) -> Option<Scalar> {
        if text.is_empty() {
            return None;
        }
        if let Ok(v) = text.parse::<i64>() {
            return Some(Scalar::Int(v));
        }
        if let Ok(v) = text.parse::<f64>() {
            return Some(Scalar::Float(v));
        }
        Some(Scalar::Str(text.to_string()))
    }

    /// Numeric view of the cell; strings have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Str(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            // `{:?}` keeps the fraction on integral values so 80.0 reads
            // back as a float, not as Int(80)
            Scalar::Float(v) => write!(f, "{:?}", v),
            Scalar::Str(v) => write!(f, "{}", v),
        }
    }
}

/// Identifies one cell of an experiment batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunIdentity {
    pub nodes: usize,
    pub trial: usize,
    pub seed: u64,
}

pub const NODES: &str = "Nodes";
pub const TRIAL: &str = "Trial";
pub const SEED: &str = "Seed";
pub const OUTPUT_FILE: &str = "Output file";
pub const WALL_TIME: &str = "Wall time (s)";

pub const AVG_REWARD_DIFFERENCE: &str = "avg_reward_difference";
pub const PERCENTAGE_COMPLETE_DIFFERENCE: &str = "percentage_complete_difference";
pub const POLICY_SIZE_RATIO: &str = "policy_size_ratio";
pub const RUNTIME_RATIO: &str = "runtime_ratio";

/// Flat, ordered column -> value mapping for one harvested run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRecord {
    cells: Vec<(String, Scalar)>,
}

impl RunRecord {
    pub fn new(identity: RunIdentity) -> Self {
        let mut record = RunRecord::default();
        record.set(NODES, Scalar::Int(identity.nodes as i64));
        record.set(TRIAL, Scalar::Int(identity.trial as i64));
        let seed = match i64::try_from(identity.seed) {
            Ok(seed) => Scalar::Int(seed),
            Err(_) => Scalar::Str(identity.seed.to_string()),
        };
        record.set(SEED, seed);
        record
    }

    /// Stores `value` under `column`, replacing an existing value in place.
    pub fn set(&mut self, column: &str, value: Scalar) {
        match self.cells.iter_mut().find(|(name, _)| name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Scalar::as_f64)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Cells laid out along `columns`; columns this record lacks are empty.
    pub fn row(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| self.get(column).map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }
}

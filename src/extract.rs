use regex::Regex;

use crate::{
    error::{Error, Result},
    record::Scalar,
};

const INT_PATTERN: &str = r"-?\d+";
// Alternatives are tried left to right at the leftmost position, so "12.34"
// is taken whole by the first one rather than stopping at "12".
const FLOAT_PATTERN: &str = r"-?\d+[.,\d]+|-?\d*\.\d+|-?\d+|-?inf";

/// How the value of a matched line is turned into a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Int,
    Float,
    /// Zero-based iteration index on the line, reported as a count.
    Iteration,
}

/// Compiled number patterns shared by all extractors.
#[derive(Debug, Clone)]
pub struct NumberPatterns {
    int: Regex,
    float: Regex,
}

impl NumberPatterns {
    pub fn new() -> Result<Self> {
        Ok(NumberPatterns {
            int: Regex::new(INT_PATTERN)?,
            float: Regex::new(FLOAT_PATTERN)?,
        })
    }

    pub fn extract_int(&self, line: &str) -> Result<i64> {
        let found = self.int.find(line).ok_or_else(|| Error::NoNumber {
            kind: "integer",
            line: line.to_string(),
        })?;
        found.as_str().parse().map_err(|_| Error::InvalidNumber {
            kind: "integer",
            text: found.as_str().to_string(),
            line: line.to_string(),
        })
    }

    pub fn extract_float(&self, line: &str) -> Result<f64> {
        let found = self.float.find(line).ok_or_else(|| Error::NoNumber {
            kind: "float",
            line: line.to_string(),
        })?;
        let text = found.as_str();
        // the pattern still takes "12,5" whole so it fails here instead of
        // being read as 12; `f64::from_str` has no comma form
        text.parse().map_err(|_| Error::InvalidNumber {
            kind: "float",
            text: text.to_string(),
            line: line.to_string(),
        })
    }

    pub fn extract_iteration(&self, line: &str) -> Result<i64> {
        Ok(self.extract_int(line)? + 1)
    }

    pub fn apply(&self, extractor: Extractor, line: &str) -> Result<Scalar> {
        match extractor {
            Extractor::Int => self.extract_int(line).map(Scalar::Int),
            Extractor::Float => self.extract_float(line).map(Scalar::Float),
            Extractor::Iteration => self.extract_iteration(line).map(Scalar::Int),
        }
    }
}

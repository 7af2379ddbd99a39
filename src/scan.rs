use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use tracing::debug;

use crate::{
    catalog::{Metric, PatternCatalog},
    error::{Error, Result},
    record::Scalar,
};

/// Metric values found in one solver output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    values: HashMap<Metric, Scalar>,
}

impl Scan {
    pub fn insert(&mut self, metric: Metric, value: Scalar) {
        self.values.insert(metric, value);
    }

    pub fn get(&self, metric: Metric) -> Option<&Scalar> {
        self.values.get(&metric)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn require(&self, metric: Metric) -> Result<&Scalar> {
        self.get(metric)
            .ok_or_else(|| Error::MissingMetrics(vec![metric.column()]))
    }

    /// Numeric value of a metric that must be present.
    pub fn require_f64(&self, metric: Metric) -> Result<f64> {
        match self.require(metric)? {
            Scalar::Str(text) => Err(Error::InvalidNumber {
                kind: "metric",
                text: text.clone(),
                line: metric.column(),
            }),
            value => Ok(value.as_f64().unwrap_or(f64::NAN)),
        }
    }

    /// Fails with every absent metric listed, not just the first.
    pub fn require_all(&self, metrics: &[Metric]) -> Result<()> {
        let missing: Vec<String> = metrics
            .iter()
            .filter(|m| !self.values.contains_key(m))
            .map(|m| m.column())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingMetrics(missing))
        }
    }
}

/// Scans `reader` line by line; each catalog label contained in a line
/// stores its extracted value, replacing earlier ones for the same metric.
pub fn scan<R: BufRead>(reader: R, catalog: &PatternCatalog) -> Result<Scan> {
    let mut result = Scan::default();
    for line in reader.lines() {
        let line = line?;
        for pattern in catalog.patterns() {
            if !line.contains(pattern.label.as_str()) {
                continue;
            }
            let value = catalog.numbers().apply(pattern.extractor, &line)?;
            result.insert(pattern.metric, value);
        }
    }
    debug!(metrics = result.len(), "scanned solver output");
    Ok(result)
}

pub fn scan_file<P: AsRef<Path>>(path: P, catalog: &PatternCatalog) -> Result<Scan> {
    let file = File::open(path.as_ref())?;
    scan(BufReader::new(file), catalog)
}

use std::{fs::File, path::Path};

use csv::{Reader, Writer};
use tracing::debug;

use crate::{
    catalog::PatternCatalog,
    derive::derived_columns,
    error::Result,
    record::{RunRecord, Scalar, NODES, OUTPUT_FILE, SEED, TRIAL, WALL_TIME},
};

/// Every column a result row can have, in file order.
pub fn schema(catalog: &PatternCatalog) -> Vec<String> {
    let mut columns: Vec<String> = [NODES, TRIAL, SEED, OUTPUT_FILE, WALL_TIME]
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.extend(catalog.metrics().into_iter().map(|m| m.column()));
    columns.extend(derived_columns());
    columns
}

/// Result file that grows by one flushed row per harvested run.
pub struct ResultsTable {
    writer: Writer<File>,
    columns: Vec<String>,
    header_written: bool,
    rows: usize,
}

impl ResultsTable {
    pub fn create<P: AsRef<Path>>(path: P, columns: Vec<String>) -> Result<Self> {
        Ok(ResultsTable {
            writer: Writer::from_path(path)?,
            columns,
            header_written: false,
            rows: 0,
        })
    }

    pub fn append(&mut self, record: &RunRecord) -> Result<()> {
        if !self.header_written {
            self.writer.write_record(&self.columns)?;
            self.header_written = true;
        }
        self.writer.write_record(record.row(&self.columns))?;
        self.writer.flush()?;
        self.rows += 1;
        debug!(rows = self.rows, "appended result row");
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Writes the whole batch at once, header included.
pub fn write_all<P: AsRef<Path>>(path: P, columns: &[String], records: &[RunRecord]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(record.row(columns))?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads a results file; empty cells are left out of the records.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<RunRecord>> {
    let mut reader = Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = RunRecord::default();
        for (column, cell) in headers.iter().zip(row.iter()) {
            if let Some(value) = Scalar::parse_cell(cell) {
                record.set(column, value);
            }
        }
        records.push(record);
    }
    Ok(records)
}

pub mod catalog;
pub mod cli;
pub mod config;
pub mod derive;
pub mod error;
pub mod experiment;
pub mod extract;
pub mod provision;
pub mod record;
pub mod runner;
pub mod scan;
pub mod stats;
pub mod table;

pub use error::{Error, Result};

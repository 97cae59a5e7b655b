use crate::errors::*;

use crate::base::Warning;
use serde::Serialize;


/// Summary of a single anonymization run, serialised for reports.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JSONReport {
    pub k: usize,
    pub l: usize,
    pub num_records: usize,
    pub k_violated: bool,
    pub l_violated: bool,
    pub generalized: bool,
    pub num_partitions: usize,
    pub num_ranges: usize,
    pub num_merged_ranges: usize,
    pub num_tail_corrections: usize,
    pub heuristic_utility: f64,
    /// None when the divergence is undefined
    pub kl_divergence: Option<f64>,
    pub warnings: Vec<Warning>,
}

pub fn to_json(report: &JSONReport) -> Result<String> {
    serde_json::to_string_pretty(report)
        .chain_err(|| "unable to serialize report into json")
}

//! Stage implementations
//!
//! Each stage represents one transformation of the working dataframe.
//! The stages are Suppress for dropping directly-identifying columns, Cast for typing the numeric quasi-identifier,
//! Coarsen for reducing dates to months, and Generalize for merging buckets into ranges.
//!
//! Every stage implements the Evaluable trait. Materialize (loading) and utility scoring sit
//! outside the chain, at its source and its end.

use flightanon_validator::errors::*;
use flightanon_validator::base::{Dataframe, Warning};

pub mod cast;
pub mod coarsen;
pub mod generalize;
pub mod materialize;
pub mod suppress;
pub mod utility;

use crate::components::generalize::Range;

/// Evaluable stage trait
///
/// Evaluable structs represent one transformation of the working dataframe.
pub trait Evaluable: std::fmt::Debug {
    /// The concrete transformation that the struct represents.
    ///
    /// # Arguments
    /// * `data` - the working dataframe. The stage takes ownership, and the previous value is not observable afterwards.
    ///
    /// # Returns
    /// The transformed dataframe, with the utility the stage gave up and any warnings it raised
    fn evaluate(&self, data: Dataframe) -> Result<ReleaseNode>;
}

/// Output of a single stage.
#[derive(Clone, Debug, PartialEq)]
pub struct ReleaseNode {
    pub value: Dataframe,
    /// heuristic utility given up by this stage
    pub utility_loss: f64,
    /// generalized ranges, in output order (only produced by Generalize)
    pub ranges: Vec<Range>,
    pub warnings: Vec<Warning>,
}

impl ReleaseNode {
    pub fn new(value: Dataframe) -> ReleaseNode {
        ReleaseNode { value, utility_loss: 0., ranges: Vec::new(), warnings: Vec::new() }
    }

    pub fn with_utility_loss(mut self, utility_loss: f64) -> ReleaseNode {
        self.utility_loss = utility_loss;
        self
    }
}

use flightanon_validator::errors::*;

use flightanon_validator::base::Dataframe;
use crate::components::{Evaluable, ReleaseNode};
use tracing::debug;

/// Heuristic utility given up per column named for suppression.
pub const SUPPRESSION_LOSS: f64 = 0.01;

/// Drops directly-identifying columns from every record.
#[derive(Clone, Debug, PartialEq)]
pub struct Suppress {
    pub columns: Vec<String>,
}

impl Evaluable for Suppress {
    fn evaluate(&self, data: Dataframe) -> Result<ReleaseNode> {
        Ok(ReleaseNode::new(suppress(data, &self.columns))
            .with_utility_loss(self.columns.len() as f64 * SUPPRESSION_LOSS))
    }
}

/// Removes the named columns. Names that are not present are ignored.
///
/// # Arguments
/// * `data` - Dataframe to be suppressed.
/// * `columns` - Names of the columns to drop.
///
/// # Return
/// The dataframe without the named columns, with record order and the order of remaining columns preserved.
///
/// # Example
/// ```
/// use flightanon_validator::base::{Array, Dataframe};
/// use flightanon_runtime::components::suppress::suppress;
///
/// let data = Dataframe::from_columns(vec![
///     ("First Name", Array::from(vec!["Edithe", "Elwood"])),
///     ("Gender", Array::from(vec!["Female", "Male"])),
/// ]).unwrap();
/// let suppressed = suppress(data, &["First Name".to_string(), "Pilot Name".to_string()]);
/// assert_eq!(suppressed.column_names().collect::<Vec<_>>(), vec!["Gender"]);
/// assert_eq!(suppressed.num_records(), 2);
/// ```
pub fn suppress(mut data: Dataframe, columns: &[String]) -> Dataframe {
    columns.iter().for_each(|name| if data.remove(name).is_none() {
        debug!(column = name.as_str(), "suppressed column is not present");
    });
    data
}

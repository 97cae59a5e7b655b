use flightanon_validator::errors::*;

use flightanon_validator::base::{Array, Dataframe, YearMonth};
use crate::components::{Evaluable, ReleaseNode};
use chrono::{Datelike, NaiveDate};
use ndarray::Array1;

/// Heuristic utility given up by discarding the day component.
pub const COARSENING_LOSS: f64 = 0.05;

/// Level-1 generalization: rewrites the temporal quasi-identifier to month granularity.
#[derive(Clone, Debug, PartialEq)]
pub struct Coarsen {
    pub column: String,
    /// chrono format strings tried in order
    pub formats: Vec<String>,
}

impl Evaluable for Coarsen {
    fn evaluate(&self, mut data: Dataframe) -> Result<ReleaseNode> {
        let months = coarsen(data.column(&self.column)?, &self.formats)?;
        data.insert(self.column.clone(), Array::Month(months))?;
        Ok(ReleaseNode::new(data).with_utility_loss(COARSENING_LOSS))
    }
}

/// Coarsens every date in a column to its calendar month.
///
/// Month columns are returned unchanged, so coarsening twice is harmless.
pub fn coarsen(data: &Array, formats: &[String]) -> Result<Array1<YearMonth>> {
    match data {
        Array::Month(data) => Ok(data.clone()),
        Array::Str(data) => data.iter()
            .map(|value| parse_month(value, formats))
            .collect(),
        Array::Int(_) => Err("integer columns cannot be coarsened to months".into())
    }
}

/// Parses a date and discards its day.
///
/// A value already of the form `YYYY-MM` is accepted as is. Otherwise each format is tried in order.
///
/// # Arguments
/// * `value` - Textual date.
/// * `formats` - chrono format strings, e.g. `%m/%d/%Y`.
///
/// # Return
/// The month of the date, or a `MalformedDate` error if no format matches.
///
/// # Example
/// ```
/// use flightanon_runtime::components::coarsen::parse_month;
///
/// let formats = vec!["%Y-%m-%d".to_string(), "%m/%d/%Y".to_string()];
/// assert_eq!(parse_month("6/28/2022", &formats).unwrap().to_string(), "2022-06");
/// assert_eq!(parse_month("2022-12-01", &formats).unwrap().to_string(), "2022-12");
/// assert_eq!(parse_month("2022-12", &formats).unwrap().to_string(), "2022-12");
/// assert!(parse_month("28th of June", &formats).is_err());
/// ```
pub fn parse_month(value: &str, formats: &[String]) -> Result<YearMonth> {
    let value = value.trim();
    if let Ok(month) = value.parse::<YearMonth>() {
        return Ok(month);
    }
    formats.iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| ErrorKind::MalformedDate(value.to_string()).into())
        .and_then(|date| YearMonth::new(date.year(), date.month()))
}


#[cfg(test)]
mod test_coarsen {
    use flightanon_validator::base::{Array, Dataframe};
    use flightanon_validator::errors::ErrorKind;
    use crate::components::Evaluable;
    use crate::components::coarsen::Coarsen;

    fn stage() -> Coarsen {
        Coarsen {
            column: "Departure Date".to_string(),
            formats: vec!["%Y-%m-%d".to_string(), "%m/%d/%Y".to_string()],
        }
    }

    #[test]
    fn rewrites_dates_in_place() {
        let data = Dataframe::from_columns(vec![
            ("Departure Date", Array::from(vec!["6/28/2022", "12/26/2022", "2022-01-10"])),
            ("Age", Array::from(vec![62_i64, 62, 67])),
        ]).unwrap();

        let node = stage().evaluate(data).unwrap();
        let months = node.value.column("Departure Date").unwrap().month().unwrap()
            .iter().map(|m| m.to_string()).collect::<Vec<String>>();
        assert_eq!(months, vec!["2022-06", "2022-12", "2022-01"]);
        assert_eq!(node.value.column_names().next().unwrap(), "Departure Date");
        assert!(node.utility_loss > 0.);
    }

    #[test]
    fn malformed_date_is_fatal() {
        let data = Dataframe::from_columns(vec![
            ("Departure Date", Array::from(vec!["6/28/2022", "2022-02-30"])),
        ]).unwrap();

        let error = stage().evaluate(data).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::MalformedDate(value) if value == "2022-02-30"));
    }
}

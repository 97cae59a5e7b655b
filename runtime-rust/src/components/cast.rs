use flightanon_validator::errors::*;

use flightanon_validator::base::{Array, Dataframe};
use crate::components::{Evaluable, ReleaseNode};
use ndarray::Array1;

/// Types the numeric quasi-identifier column as integers.
#[derive(Clone, Debug, PartialEq)]
pub struct Cast {
    pub column: String,
}

impl Evaluable for Cast {
    fn evaluate(&self, mut data: Dataframe) -> Result<ReleaseNode> {
        let cast = cast_int(data.column(&self.column)?, &self.column)?;
        data.insert(self.column.clone(), Array::Int(cast))?;
        Ok(ReleaseNode::new(data))
    }
}

/// Cast a column to type `i64`.
///
/// If data are `String`, parse each trimmed value as `i64`.
/// If data are already `i64`, they are returned unchanged.
///
/// # Arguments
/// * `data` - Column to be cast.
/// * `name` - Name of the column, used to report malformed values.
///
/// # Return
/// Data cast to `i64`, or a `MalformedValue` error naming the first value that does not parse.
///
/// # Example
/// ```
/// use ndarray::arr1;
/// use flightanon_validator::base::Array;
/// use flightanon_runtime::components::cast::cast_int;
///
/// let ages = Array::from(vec!["62", " 7", "33"]);
/// assert_eq!(cast_int(&ages, "Age").unwrap(), arr1(&[62_i64, 7, 33]));
/// assert!(cast_int(&Array::from(vec!["62", "n/a"]), "Age").is_err());
/// ```
pub fn cast_int(data: &Array, name: &str) -> Result<Array1<i64>> {
    match data {
        Array::Int(data) => Ok(data.clone()),
        Array::Str(data) => data.iter().enumerate()
            .map(|(row, value)| value.trim().parse::<i64>()
                .map_err(|_| ErrorKind::MalformedValue(name.to_string(), row, value.clone()).into()))
            .collect(),
        Array::Month(_) => Err(format!("column {:?}: months cannot be cast to integers", name).into())
    }
}


#[cfg(test)]
mod test_cast {
    use flightanon_validator::base::{Array, Dataframe};
    use flightanon_validator::errors::ErrorKind;
    use crate::components::Evaluable;
    use crate::components::cast::Cast;

    #[test]
    fn malformed_value_names_the_row() {
        let data = Dataframe::from_columns(vec![("Age", Array::from(vec!["40", "forty"]))]).unwrap();
        let error = Cast { column: "Age".to_string() }.evaluate(data).unwrap_err();
        match error.kind() {
            ErrorKind::MalformedValue(column, row, value) => {
                assert_eq!(column, "Age");
                assert_eq!(*row, 1);
                assert_eq!(value, "forty");
            }
            other => panic!("unexpected error: {}", other)
        }
    }

    #[test]
    fn cast_keeps_column_position() {
        let data = Dataframe::from_columns(vec![
            ("Age", Array::from(vec!["40", "41"])),
            ("Gender", Array::from(vec!["Male", "Female"])),
        ]).unwrap();
        let cast = Cast { column: "Age".to_string() }.evaluate(data).unwrap().value;
        assert_eq!(cast.column_names().next().unwrap(), "Age");
        assert_eq!(cast.column("Age").unwrap(), &Array::from(vec![40_i64, 41]));
    }
}

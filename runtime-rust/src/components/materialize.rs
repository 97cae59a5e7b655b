use flightanon_validator::errors::*;

use flightanon_validator::base::{Array, Dataframe};
use indexmap::IndexMap;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Loads a CSV file with a header row into a dataframe of string columns.
pub fn materialize(path: impl AsRef<Path>) -> Result<Dataframe> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .chain_err(|| format!("provided file path could not be opened: {}", path.display()))?;
    let data = read_csv(file)
        .chain_err(|| format!("failed to read {}", path.display()))?;
    info!(path = %path.display(), records = data.num_records(), columns = data.num_columns(), "materialized");
    Ok(data)
}

/// Parses CSV with a header row into a dataframe of string columns, in file column order.
///
/// Cells that are not valid UTF-8 are decoded as ISO-8859-1.
///
/// # Arguments
/// * `reader` - Source of the CSV text.
///
/// # Return
/// A dataframe with one `Str` column per header field. Duplicate header names and rows whose
/// length differs from the header are errors.
///
/// # Example
/// ```
/// use flightanon_runtime::components::materialize::read_csv;
///
/// let text = "Gender,Age\nFemale,62\nMale,7\n";
/// let data = read_csv(text.as_bytes()).unwrap();
/// assert_eq!(data.column_names().collect::<Vec<_>>(), vec!["Gender", "Age"]);
/// assert_eq!(data.record(1), vec!["Male", "7"]);
///
/// assert!(read_csv("Gender,Age\nFemale\n".as_bytes()).is_err());
/// ```
pub fn read_csv<R: Read>(reader: R) -> Result<Dataframe> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.byte_headers()?.iter()
        .map(decode)
        .collect::<Vec<String>>();

    let mut response = headers.iter()
        .map(|_| Vec::new())
        .collect::<Vec<Vec<String>>>();

    reader.byte_records().map(|record| {
        record?.iter().enumerate()
            .for_each(|(idx, value)| response[idx].push(decode(value)));
        Ok(())
    }).collect::<Result<()>>()?;

    let mut columns = IndexMap::with_capacity(headers.len());
    for (name, column) in headers.into_iter().zip(response) {
        if columns.contains_key(&name) {
            return Err(format!("duplicate column name in header: {:?}", name).into());
        }
        columns.insert(name, Array::from(column));
    }
    Dataframe::new(columns)
}

fn decode(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(value) => value.to_string(),
        Err(_) => value.iter().map(|&byte| byte as char).collect()
    }
}


#[cfg(test)]
mod test_materialize {
    use crate::components::materialize::{materialize, read_csv};

    #[test]
    fn latin1_cells_are_decoded() {
        let mut text = b"First Name,Country Name\n".to_vec();
        text.extend_from_slice(b"Ren\xe9e,C\xf4te d'Ivoire\n");
        let data = read_csv(&text[..]).unwrap();
        assert_eq!(data.record(0), vec!["Renée", "Côte d'Ivoire"]);
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let data = read_csv("Airport Name,Age\n\"Lyon, Saint-Exupery\",41\n".as_bytes()).unwrap();
        assert_eq!(data.record(0), vec!["Lyon, Saint-Exupery", "41"]);
    }

    #[test]
    fn header_only_file_has_no_records() {
        let data = read_csv("Gender,Age\n".as_bytes()).unwrap();
        assert_eq!(data.num_columns(), 2);
        assert_eq!(data.num_records(), 0);
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        assert!(read_csv("Age,Age\n1,2\n".as_bytes()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(materialize("/nonexistent/flights.csv").is_err());
    }
}

use flightanon_validator::errors::*;

use flightanon_validator::base::Dataframe;
use std::io::Write;
use std::path::Path;
use tracing::info;


/// Writes a dataframe as CSV with a header row.
///
/// Cells are written in their display form, so months are rendered as `YYYY-MM`.
///
/// # Arguments
/// * `data` - Dataframe to be written.
/// * `writer` - Destination of the CSV text.
///
/// # Example
/// ```
/// use flightanon_validator::base::{Array, Dataframe, YearMonth};
/// use flightanon_runtime::utilities::write_csv;
///
/// let data = Dataframe::from_columns(vec![
///     ("Departure Date", Array::from(vec![YearMonth::new(2022, 6).unwrap()])),
///     ("Age", Array::from(vec!["62--67"])),
/// ]).unwrap();
///
/// let mut buffer = Vec::new();
/// write_csv(&data, &mut buffer).unwrap();
/// assert_eq!(String::from_utf8(buffer).unwrap(), "Departure Date,Age\n2022-06,62--67\n");
/// ```
pub fn write_csv<W: Write>(data: &Dataframe, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(data.column_names())?;
    (0..data.num_records())
        .map(|idx| writer.write_record(data.record(idx)))
        .collect::<std::result::Result<(), csv::Error>>()?;
    writer.flush()?;
    Ok(())
}

/// Writes a dataframe to a CSV file, replacing any existing file.
pub fn export(data: &Dataframe, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .chain_err(|| format!("unable to create {}", path.display()))?;
    write_csv(data, file)
        .chain_err(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), records = data.num_records(), "exported");
    Ok(())
}


#[cfg(test)]
mod test_utilities {
    use flightanon_validator::base::{Array, Dataframe};
    use crate::components::materialize::read_csv;
    use crate::utilities::write_csv;

    #[test]
    fn fields_with_commas_are_quoted() {
        let data = Dataframe::from_columns(vec![
            ("Airport Name", Array::from(vec!["Lyon, Saint-Exupery"])),
            ("Age", Array::from(vec![41_i64])),
        ]).unwrap();
        let mut buffer = Vec::new();
        write_csv(&data, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer.clone()).unwrap(), "Airport Name,Age\n\"Lyon, Saint-Exupery\",41\n");
        assert_eq!(read_csv(&buffer[..]).unwrap().record(0), vec!["Lyon, Saint-Exupery", "41"]);
    }

    #[test]
    fn empty_dataframe_writes_header_only() {
        let data = Dataframe::from_columns(vec![("Gender", Array::from(Vec::<String>::new()))]).unwrap();
        let mut buffer = Vec::new();
        write_csv(&data, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "Gender\n");
    }
}

//! CSV input and tabular output files.

use std::{
    io::{Read, Write},
    path::Path,
};

use lcz_map_zone_models::Sample;
use serde::Serialize;

use crate::error::CliError;

/// Reads `lat,lon,temperature` samples, with an optional `lcz_class`
/// column for samples whose class is already known.
///
/// # Errors
///
/// Returns [`CliError::Csv`] if a row is malformed.
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<Sample>, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let samples = reader
        .deserialize::<Sample>()
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Read {} samples", samples.len());
    Ok(samples)
}

/// Reads samples from a CSV file.
///
/// # Errors
///
/// See [`read_samples`].
pub fn read_samples_file(path: &Path) -> Result<Vec<Sample>, CliError> {
    let file = std::fs::File::open(path).map_err(|e| CliError::io(path, e))?;
    read_samples(file)
}

/// Serializes rows as CSV with a header line.
///
/// # Errors
///
/// Returns [`CliError::Csv`] if a row cannot be written.
pub fn write_table<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .map_err(|e| CliError::io("<csv output>", e))?;
    Ok(())
}

/// Writes rows to a CSV file.
///
/// # Errors
///
/// See [`write_table`].
pub fn write_table_file<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), CliError> {
    let file = std::fs::File::create(path).map_err(|e| CliError::io(path, e))?;
    write_table(file, rows)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Writes a text file.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the file cannot be written.
pub fn write_text_file(path: &Path, text: &str) -> Result<(), CliError> {
    std::fs::write(path, text).map_err(|e| CliError::io(path, e))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_samples_with_and_without_class() {
        let csv = "lat, lon, temperature\n-29.5, -51.9, 27.4\n-29.6,-51.8,26\n";
        let samples = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert!((samples[0].temperature - 27.4).abs() < f64::EPSILON);
        assert!(samples.iter().all(|s| s.class.is_none()));

        let csv = "lat,lon,temperature,lcz_class\n1,2,30,6\n3,4,25,\n";
        let samples = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(samples[0].class.as_ref().map(|c| c.as_str()), Some("6"));
        assert!(samples[1].class.is_none());
    }

    #[test]
    fn rejects_non_numeric_rows() {
        let csv = "lat,lon,temperature\nnorth,2,30\n";
        assert!(matches!(
            read_samples(csv.as_bytes()),
            Err(CliError::Csv(_))
        ));
    }

    #[test]
    fn writes_header_and_rows() {
        let samples = vec![
            Sample::new(1.0, 2.0, 30.5),
            Sample::with_class(3.0, 4.0, 25.0, "A".into()),
        ];
        let mut out = Vec::new();
        write_table(&mut out, &samples).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["lat,lon,temperature,lcz_class", "1.0,2.0,30.5,", "3.0,4.0,25.0,A"]);
    }
}

//! Read tabular planet exports into [`RawRow`]s.
//!
//! Exports come from several tools: spreadsheet saves, NASA archive downloads,
//! latin-1 encoded dumps with mangled headers. Rows are read as bytes; each
//! field is UTF-8 when valid and Windows-1252 otherwise, so a latin-1 cell
//! keeps its characters and never aborts a whole upload.

use anyhow::{Context, Result};
use redshift_core::RawRow;
use std::io::Read;
use std::path::Path;

/// Decode one field: UTF-8 when valid, else Windows-1252 (a superset of latin-1).
pub fn decode_field(field: &[u8]) -> String {
    match std::str::from_utf8(field) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(field);
            text.into_owned()
        }
    }
}

/// Read a CSV with a header row from any reader.
///
/// Rows may be shorter or longer than the header. Fully blank rows are skipped.
pub fn read_rows_from_reader<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()
        .context("reading header row")?
        .iter()
        .map(decode_field)
        .collect();

    let mut rows = Vec::new();
    for (i, result) in rdr.byte_records().enumerate() {
        let record = result.with_context(|| format!("reading row {}", i + 2))?;
        let values: Vec<String> = record.iter().map(decode_field).collect();
        let row = RawRow::from_record(&headers, &values);
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    tracing::debug!(rows = rows.len(), columns = headers.len(), "read csv rows");
    Ok(rows)
}

/// Read a CSV file with a header row.
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_rows_from_reader(file).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redshift_core::normalize;

    #[test]
    fn test_reads_ragged_rows_and_skips_blank_lines() {
        let data = "Planet_name,orbital_period,Planet_radius\n\
                    Kepler-22 b,289.86,2.38\n\
                    ,,\n\
                    Kepler-452 b,384.84\n";
        let rows = read_rows_from_reader(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let rec = normalize(&rows[1]);
        assert_eq!(rec.name.as_deref(), Some("Kepler-452 b"));
        assert_eq!(rec.orbital_period_days, Some(384.84));
        assert_eq!(rec.planet_radius_earth, None);
    }

    #[test]
    fn test_latin1_bytes_do_not_abort() {
        // 0xB0 is a latin-1 degree sign, invalid as UTF-8
        let mut data = b"Planet_name,Stellar_temperature\xC3\x82\xC2\n".to_vec();
        data.extend_from_slice(b"Star \xB0 b,5757\n");
        let rows = read_rows_from_reader(data.as_slice()).unwrap();
        assert_eq!(rows.len(), 1);

        let rec = normalize(&rows[0]);
        assert_eq!(rec.stellar_temp_k, Some(5757.0));
        assert_eq!(rec.name.as_deref(), Some("Star \u{b0} b"));
    }

    #[test]
    fn test_decode_field() {
        assert_eq!(decode_field("Kepler-22 b Été".as_bytes()), "Kepler-22 b Été");
        assert_eq!(decode_field(b"\xC9t\xE9"), "Été");
        // 0x80 is the euro sign in Windows-1252
        assert_eq!(decode_field(b"\x80"), "\u{20ac}");
    }

    #[test]
    fn test_header_only_file() {
        let rows = read_rows_from_reader("Planet_name,Declination\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }
}

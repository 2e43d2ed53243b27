//! Catalog persistence: load the confirmed dataset, append confirmed planets, save candidates.
//!
//! Files are always written with the canonical column layout, so a dataset
//! that arrived with odd header spellings is cleaned up on its first rewrite.

use anyhow::{Context, Result, bail};
use redshift_core::{CANONICAL_COLUMNS, ConfirmedCatalog, PlanetRecord, field_for_header, field_text};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::reader::{decode_field, read_rows};

/// Load the confirmed catalog. A missing file is an empty catalog.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<ConfirmedCatalog> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "confirmed dataset not found; starting with an empty catalog");
        return Ok(ConfirmedCatalog::new());
    }
    let rows = read_rows(path)?;
    let catalog = ConfirmedCatalog::from_rows(&rows);
    tracing::info!(path = %path.display(), planets = catalog.len(), "loaded confirmed catalog");
    Ok(catalog)
}

fn write_records<W: Write>(out: W, records: &[PlanetRecord], with_header: bool) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    if with_header {
        wtr.write_record(CANONICAL_COLUMNS)?;
    }
    for r in records {
        wtr.serialize(r)
            .with_context(|| format!("serializing {}", r.display_name()))?;
    }
    wtr.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    Ok(())
}

/// Rewrite the whole dataset: write a sibling temp file, then rename over the original.
pub fn write_catalog(path: impl AsRef<Path>, catalog: &ConfirmedCatalog) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let tmp = path.with_extension("csv.tmp");
    let file = fs::File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    write_records(file, catalog.records(), true)
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;

    tracing::debug!(path = %path.display(), planets = catalog.len(), "wrote confirmed catalog");
    Ok(())
}

/// Append a newly confirmed planet and persist the grown catalog.
pub fn append_confirmed(path: impl AsRef<Path>, record: PlanetRecord) -> Result<ConfirmedCatalog> {
    let path = path.as_ref();
    let mut catalog = load_catalog(path)?;
    tracing::info!(name = record.display_name(), path = %path.display(), "adding confirmed planet");
    catalog.append(record);
    write_catalog(path, &catalog)?;
    Ok(catalog)
}

/// Header of an existing, non-empty dataset file. `None` for a missing or empty file.
fn existing_header(path: &Path) -> Result<Option<Vec<String>>> {
    if fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true) {
        return Ok(None);
    }
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let header = rdr
        .byte_headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .map(decode_field)
        .collect();
    Ok(Some(header))
}

/// Lay `record` out under `header`, resolving each column through the field aliases.
///
/// Columns that name no known field are left empty. A header with no known
/// field at all is an error: the row could never be read back.
fn row_for_header(header: &[String], record: &PlanetRecord) -> Result<Vec<String>> {
    let fields: Vec<_> = header.iter().map(|h| field_for_header(h)).collect();
    if fields.iter().all(Option::is_none) {
        bail!("header has no known planet columns: {}", header.join(","));
    }
    Ok(fields
        .into_iter()
        .map(|f| f.and_then(|f| field_text(record, f)).unwrap_or_default())
        .collect())
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut f = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    if f.metadata()?.len() == 0 {
        return Ok(true);
    }
    f.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    f.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Append one unverified candidate.
///
/// A new or empty file gets the canonical header. An existing file keeps its
/// own header and the row is written in that column order.
pub fn save_candidate(path: impl AsRef<Path>, record: &PlanetRecord) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let header = existing_header(path)?;
    let row = match &header {
        Some(h) => Some(
            row_for_header(h, record).with_context(|| format!("append {}", path.display()))?,
        ),
        None => None,
    };
    let needs_newline = header.is_some() && !ends_with_newline(path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    if needs_newline {
        file.write_all(b"\n")?;
    }

    match row {
        Some(row) => {
            let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
            wtr.write_record(&row)
                .with_context(|| format!("append {}", path.display()))?;
            wtr.flush()?;
        }
        None => write_records(file, std::slice::from_ref(record), true)
            .with_context(|| format!("append {}", path.display()))?,
    }

    tracing::info!(name = record.display_name(), path = %path.display(), "saved candidate");
    Ok(())
}

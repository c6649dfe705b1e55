use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::record::{NormalizedRecord, Source};

use super::ExportError;

const TPB_COLUMNS: &[&str] = &[
    "Title",
    "Year",
    "Resolution",
    "Seeders",
    "Leechers",
    "Size",
    "UploadedDate",
    "Uploader",
    "ID",
    "MagnetLink",
];

const EZTV_COLUMNS: &[&str] = &[
    "Title",
    "Year",
    "Season",
    "Episode",
    "Resolution",
    "Size",
    "Seeds",
    "Peers",
    "ReleaseDate",
    "ID",
    "MagnetLink",
];

/// How an existing destination file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file.
    Overwrite,
    /// Keep existing rows and add the new ones after them.
    Append,
}

/// Header row for records of `source`.
pub fn columns(source: Source) -> &'static [&'static str] {
    match source {
        Source::Tpb => TPB_COLUMNS,
        Source::Eztv => EZTV_COLUMNS,
    }
}

/// One CSV row in the column order of `source`. Absent values are empty.
pub fn record_row(source: Source, record: &NormalizedRecord) -> Vec<String> {
    fn opt<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    match source {
        Source::Tpb => vec![
            record.title.clone(),
            opt(&record.year),
            record.resolution.to_string(),
            record.seeders.to_string(),
            record.leechers.to_string(),
            record.size.clone(),
            opt(&record.date),
            opt(&record.uploader),
            opt(&record.id),
            opt(&record.magnet_link),
        ],
        Source::Eztv => vec![
            record.title.clone(),
            opt(&record.year),
            opt(&record.season),
            opt(&record.episode),
            record.resolution.to_string(),
            record.size.clone(),
            record.seeders.to_string(),
            record.leechers.to_string(),
            opt(&record.date),
            opt(&record.id),
            opt(&record.magnet_link),
        ],
    }
}

/// Write `records` to `path` and return the number of rows written.
///
/// Rows go to a temporary file next to `path` that replaces it only once
/// everything is written, so a failure leaves the destination untouched.
/// The parent directory must exist.
pub fn write_records(
    path: &Path,
    source: Source,
    records: &[NormalizedRecord],
    mode: WriteMode,
) -> Result<usize, ExportError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let header = columns(source);

    let existing = match mode {
        WriteMode::Append if path.exists() => Some(fs::read(path)?),
        _ => None,
    }
    .filter(|bytes| !bytes.is_empty());

    if let Some(bytes) = &existing {
        check_header(path, bytes, header)?;
    }

    let previous_permissions = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    let mut temp = create_temp_file(dir)?;
    // The replaced file keeps its mode.
    if let Some(permissions) = previous_permissions {
        temp.as_file().set_permissions(permissions)?;
    }

    {
        let file = temp.as_file_mut();
        if let Some(bytes) = &existing {
            file.write_all(bytes)?;
            if !bytes.ends_with(b"\n") {
                file.write_all(b"\n")?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if existing.is_none() {
            writer.write_record(header)?;
        }
        for record in records {
            writer.write_record(record_row(source, record))?;
        }
        writer.flush()?;
    }

    temp.persist(path).map_err(|e| e.error)?;

    debug!(
        path = %path.display(),
        rows = records.len(),
        appended = existing.is_some(),
        "CSV written"
    );
    Ok(records.len())
}

/// A temp file created with the mode a plain `File::create` would get
/// (0666 less the umask) instead of tempfile's owner-only default.
#[cfg(unix)]
fn create_temp_file(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .prefix(".csv-")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn create_temp_file(dir: &Path) -> io::Result<NamedTempFile> {
    tempfile::Builder::new().prefix(".csv-").tempfile_in(dir)
}

fn check_header(path: &Path, bytes: &[u8], expected: &[&str]) -> Result<(), ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes);

    let found = match reader.records().next() {
        Some(row) => row?,
        None => return Ok(()),
    };

    if found.iter().eq(expected.iter().copied()) {
        Ok(())
    } else {
        Err(ExportError::HeaderMismatch {
            path: path.display().to_string(),
            found: found.iter().collect::<Vec<_>>().join(","),
        })
    }
}

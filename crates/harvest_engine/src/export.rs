use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use harvest_core::Record;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::output_filename;

/// Column headers of the exported table.
pub const CSV_HEADERS: [&str; 3] = ["contact", "meta", "text"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot use output directory {dir:?}: {source}")]
    OutputDir { dir: PathBuf, source: io::Error },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Destination for the records accumulated by a run.
pub trait RecordSink: Send + Sync {
    /// Writes `records` under `name` and returns where they went.
    fn persist(&self, name: &str, records: &[Record]) -> Result<PathBuf, PersistError>;
}

/// Writes records as a BOM-prefixed UTF-8 CSV file so spreadsheet tools pick the
/// right encoding.
///
/// The table is streamed into a temp file next to the target and renamed over it
/// once complete; an interrupted write never leaves a truncated export, and an
/// earlier export under the same name is replaced.
#[derive(Debug, Clone)]
pub struct CsvRecordSink {
    dir: PathBuf,
    fallback_name: String,
}

impl CsvRecordSink {
    pub fn new(dir: PathBuf) -> Self {
        Self::with_fallback_name(dir, "all_chats")
    }

    /// `fallback_name` is used when the requested name sanitizes to nothing.
    pub fn with_fallback_name(dir: PathBuf, fallback_name: impl Into<String>) -> Self {
        Self {
            dir,
            fallback_name: fallback_name.into(),
        }
    }
}

impl RecordSink for CsvRecordSink {
    fn persist(&self, name: &str, records: &[Record]) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::OutputDir {
            dir: self.dir.clone(),
            source,
        })?;
        let target = self.dir.join(output_filename(name, &self.fallback_name));

        let mut tmp = write_csv(NamedTempFile::new_in(&self.dir)?, records)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }
}

/// Renders the header row plus one row per record.
pub fn render_csv(records: &[Record]) -> Result<Vec<u8>, PersistError> {
    write_csv(Vec::new(), records)
}

fn write_csv<W: Write>(mut out: W, records: &[Record]) -> Result<W, PersistError> {
    out.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record([
            record.owner_label.as_str(),
            record.meta.as_str(),
            record.text.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|err| PersistError::Io(err.into_error()))
}

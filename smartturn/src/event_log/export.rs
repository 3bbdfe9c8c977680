/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! CSV export and import of the event log.
//!
//! Layout (UTF-8, one header row, one row per entry in insertion order):
//! ```text
//! timestamp,event,side,angle,mode,status
//! 2025-03-01 10:00,Change position,RIGHT,15,AUTO,OK
//! 2025-03-01 10:20,Manual override,LEFT,20,MANUAL,OK
//! ```
//!
//! The header is always written, even for an empty log.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use super::{EventLog, LogEntry};

/// Column names of the exported CSV.
pub const CSV_HEADER: [&str; 6] = ["timestamp", "event", "side", "angle", "mode", "status"];

/// Conventional file name for downloads.
pub const EXPORT_FILE_NAME: &str = "smartturn_log.csv";

/// Media type of the export.
pub const EXPORT_MIME_TYPE: &str = "text/csv";

/// Failure while writing or reading a CSV log.
#[derive(Debug, Error)]
pub enum LogCodecError {
    /// Underlying CSV encode/decode error (includes bad field values such as
    /// an unparseable timestamp or unknown side).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The first row did not match [`CSV_HEADER`].
    #[error("unexpected CSV header: {found:?}")]
    HeaderMismatch { found: Vec<String> },
}

impl EventLog {
    /// Write the whole log as CSV to `writer`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), LogCodecError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(CSV_HEADER)?;
        for entry in self.entries() {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// The whole log as CSV bytes.
    pub fn export_csv(&self) -> Result<Vec<u8>, LogCodecError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(buf)
    }

    /// Write the CSV export to `path`, creating or truncating the file.
    pub fn export_to_file(&self, path: &Path) -> Result<(), LogCodecError> {
        let file = File::create(path)?;
        self.write_csv(file)?;
        info!(
            path = %path.display(),
            entries = self.len(),
            "Event log exported"
        );
        Ok(())
    }

    /// Rebuild a log from CSV produced by [`write_csv`](Self::write_csv).
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<EventLog, LogCodecError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = rdr.headers()?;
        if headers.iter().ne(CSV_HEADER.iter().copied()) {
            return Err(LogCodecError::HeaderMismatch {
                found: headers.iter().map(str::to_string).collect(),
            });
        }

        let mut log = EventLog::new();
        for row in rdr.deserialize::<LogEntry>() {
            log.append(row?);
        }
        Ok(log)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

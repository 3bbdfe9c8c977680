/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Append-only audit log of position changes.
//!
//! Rules:
//!   - Strict append only: no mutation, no deletion, no reordering
//!   - Entries are immutable once created (private fields, getters only)
//!   - No entry is ever rejected; capacity is unbounded
//!
//! Export / import to CSV lives in [`export`].

pub mod export;

pub use export::{LogCodecError, CSV_HEADER, EXPORT_FILE_NAME, EXPORT_MIME_TYPE};

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::clock::TIMESTAMP_FORMAT;
use crate::position::Position;

/// Status written on every entry the core produces.
pub const STATUS_OK: &str = "OK";

// ── Entry fields ──────────────────────────────────────────────────────────────

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Automatic rotation step fired by the scheduler.
    #[serde(rename = "Change position", alias = "ChangePosition")]
    ChangePosition,
    /// Operator-initiated change outside the rotation.
    #[serde(rename = "Manual override", alias = "ManualOverride")]
    ManualOverride,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::ChangePosition => "Change position",
            EventKind::ManualOverride => "Manual override",
        }
    }
}

/// Who initiated the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Auto,
    Manual,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Auto => "AUTO",
            Mode::Manual => "MANUAL",
        }
    }
}

// ── LogEntry ──────────────────────────────────────────────────────────────────

/// One immutable row of the audit log.
///
/// Field order matches the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(with = "minute_timestamp")]
    timestamp: NaiveDateTime,
    #[serde(rename = "event")]
    kind: EventKind,
    side: Position,
    angle: u32,
    mode: Mode,
    status: String,
}

impl LogEntry {
    /// Entry for an automatic rotation step.
    pub fn auto(timestamp: NaiveDateTime, side: Position, angle: u32) -> Self {
        Self::new(timestamp, EventKind::ChangePosition, side, angle, Mode::Auto)
    }

    /// Entry for a manual override.
    pub fn manual(timestamp: NaiveDateTime, side: Position, angle: u32) -> Self {
        Self::new(timestamp, EventKind::ManualOverride, side, angle, Mode::Manual)
    }

    fn new(
        timestamp: NaiveDateTime,
        kind: EventKind,
        side: Position,
        angle: u32,
        mode: Mode,
    ) -> Self {
        Self {
            timestamp,
            kind,
            side,
            angle,
            mode,
            status: STATUS_OK.to_string(),
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn side(&self) -> Position {
        self.side
    }

    /// Tilt in degrees.
    pub fn angle(&self) -> u32 {
        self.angle
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {:<15}  {:<5}  {:>2}°  {:<6}  {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.kind.label(),
            self.side,
            self.angle,
            self.mode.as_str(),
            self.status
        )
    }
}

/// Serde adapter for `YYYY-MM-DD HH:MM` timestamps.
mod minute_timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::clock::{parse_timestamp, TIMESTAMP_FORMAT};

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&t.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw)
            .map_err(|e| de::Error::custom(format!("bad timestamp '{raw}': {e}")))
    }
}

// ── EventLog ──────────────────────────────────────────────────────────────────

/// Ordered, append-only sequence of [`LogEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `entry` at the end and return a reference to the stored row.
    pub fn append(&mut self, entry: LogEntry) -> &LogEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Every entry in insertion order.  The slice can be read any number of
    /// times; it reflects the log at the moment of the call.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

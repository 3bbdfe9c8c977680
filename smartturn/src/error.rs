/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the SmartTurn protocol core.
//!
//! Every rejected mutation in the core is an *invalid argument*: an
//! out-of-range configuration value, a non-positive clock step, an unknown
//! position name or a malformed console command.  Nothing fails transiently,
//! so there is no retry classification.
//!
//! The variants stay structured (field name, offending value, bounds) so the
//! caller can report them without parsing a message.  [`ProtocolError::kind`]
//! collapses them onto the single [`ErrorKind`] exposed to consumers.
//!
//! A rejected call never leaves partial state behind: every operation
//! validates first and mutates second.

use thiserror::Error;

// ── Error classification ──────────────────────────────────────────────────────

/// Coarse classification of a [`ProtocolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed a value the core refuses; state is unchanged.
    InvalidArgument,
}

// ── Protocol errors ───────────────────────────────────────────────────────────

/// Error returned by clock, configuration, override and console operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// `Clock::advance` was called with zero or a negative step.
    #[error("clock advance must be a positive number of minutes, got {minutes}")]
    NonPositiveAdvance { minutes: i64 },

    /// `Clock::advance` would move past the last representable timestamp.
    #[error("clock advance of {minutes} minutes leaves the representable time range")]
    AdvanceOverflow { minutes: i64 },

    /// A bounded integer setting was outside its inclusive range.
    #[error("{field} = {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A position sequence was empty where at least one entry is required.
    #[error("position sequence must contain at least one side")]
    EmptySequence,

    /// A side name did not match RIGHT, LEFT or BACK.
    #[error("unknown position '{0}' (valid: RIGHT, LEFT, BACK)")]
    UnknownPosition(String),

    /// A console line could not be parsed into a command.
    #[error("malformed command '{line}': {reason}")]
    MalformedCommand { line: String, reason: String },
}

impl ProtocolError {
    /// Classification shared by every variant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::NonPositiveAdvance { .. }
            | ProtocolError::AdvanceOverflow { .. }
            | ProtocolError::OutOfRange { .. }
            | ProtocolError::EmptySequence
            | ProtocolError::UnknownPosition(_)
            | ProtocolError::MalformedCommand { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// Range check helper used by every bounded setter.
    pub(crate) fn check_range(
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    ) -> Result<(), ProtocolError> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(ProtocolError::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

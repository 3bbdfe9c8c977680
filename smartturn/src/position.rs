/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Patient positions the turn protocol rotates through.
//!
//! Carrying a typed enum through the whole pipeline (instead of a raw string)
//! makes it impossible to log or schedule an unknown side.  Text only appears
//! at the edges: the YAML config, the console and the CSV export, all of which
//! use the upper-case names `RIGHT`, `LEFT`, `BACK`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Orientation of the patient on the bed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    /// Tilted onto the right side.
    Right,
    /// Tilted onto the left side.
    Left,
    /// Lying on the back, backrest raised.  A fresh session starts here.
    #[default]
    Back,
}

impl Position {
    /// Every position in the order offered to the operator.
    pub const ALL: [Position; 3] = [Position::Right, Position::Left, Position::Back];

    /// Upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Right => "RIGHT",
            Position::Left => "LEFT",
            Position::Back => "BACK",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = ProtocolError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Position::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ProtocolError::UnknownPosition(trimmed.to_string()))
    }
}

/// Parse a comma-separated side list such as `RIGHT,LEFT,BACK`.
///
/// Empty items are skipped, so `"RIGHT,,LEFT"` yields two sides and `""`
/// yields an empty list.  Emptiness is for the caller to judge.
pub fn parse_sequence(s: &str) -> Result<Vec<Position>, ProtocolError> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(Position::from_str)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulated clock.
//!
//! Time never moves on its own: the only writer is [`Clock::advance`].  All
//! timestamps have minute resolution; seconds are dropped on construction.

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use tracing::debug;

use crate::config::{GRACE_MINUTES_RANGE, INTERVAL_MINUTES_RANGE};
use crate::error::ProtocolError;

/// Text layout used for every timestamp the core prints or exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Simulated wall clock for one bed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    current: NaiveDateTime,
}

impl Clock {
    /// Start the clock at `start`, truncated to the minute.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: truncate_to_minute(start),
        }
    }

    /// Start the clock at the host's local time, truncated to the minute.
    ///
    /// This is the one place host time is read; afterwards the clock only
    /// moves through [`advance`](Self::advance).
    pub fn starting_now() -> Self {
        Self::new(Local::now().naive_local())
    }

    /// Current simulated timestamp.
    pub fn now(&self) -> NaiveDateTime {
        self.current
    }

    /// Move the clock forward by `minutes`.
    ///
    /// # Errors
    /// [`ProtocolError::NonPositiveAdvance`] for zero or negative input,
    /// [`ProtocolError::AdvanceOverflow`] when the new time would leave no room
    /// for one more interval plus grace.  Either way the clock is left
    /// untouched.
    pub fn advance(&mut self, minutes: i64) -> Result<NaiveDateTime, ProtocolError> {
        if minutes <= 0 {
            return Err(ProtocolError::NonPositiveAdvance { minutes });
        }
        let overflow = ProtocolError::AdvanceOverflow { minutes };
        let next = Duration::try_minutes(minutes)
            .and_then(|step| self.current.checked_add_signed(step))
            .ok_or_else(|| overflow.clone())?;
        // The scheduler adds at most one interval plus grace to `now`
        let headroom = i64::from(INTERVAL_MINUTES_RANGE.1 + GRACE_MINUTES_RANGE.1);
        if next.checked_add_signed(Duration::minutes(headroom)).is_none() {
            return Err(overflow);
        }
        self.current = next;
        debug!(minutes, now = %self.current.format(TIMESTAMP_FORMAT), "clock advanced");
        Ok(self.current)
    }
}

/// Parse a `YYYY-MM-DD HH:MM` timestamp.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
}

fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

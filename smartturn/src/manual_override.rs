/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Manual position overrides.
//!
//! An override records what the operator did and updates the bed's current
//! side/angle, but it never rotates the sequence and never moves
//! `next_change_at`: the automatic schedule keeps running underneath.

use std::ops::RangeInclusive;

use tracing::info;

use crate::clock::{Clock, TIMESTAMP_FORMAT};
use crate::config::ANGLE_DEGREES_RANGE;
use crate::error::ProtocolError;
use crate::event_log::{EventLog, LogEntry};
use crate::position::Position;
use crate::scheduler::ProtocolScheduler;

/// Validates and records manual position changes.
#[derive(Debug, Clone)]
pub struct OverrideController {
    angle_range: RangeInclusive<u32>,
}

impl Default for OverrideController {
    /// Accepts the same 5–30° range as the protocol angle.
    fn default() -> Self {
        Self {
            angle_range: ANGLE_DEGREES_RANGE.0..=ANGLE_DEGREES_RANGE.1,
        }
    }
}

impl OverrideController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Angles this controller accepts.
    pub fn angle_range(&self) -> &RangeInclusive<u32> {
        &self.angle_range
    }

    /// Apply a manual override at the clock's current time.
    ///
    /// # Errors
    /// [`ProtocolError::OutOfRange`] when `angle` is outside
    /// [`angle_range`](Self::angle_range).  Nothing is logged and the
    /// scheduler is untouched.
    pub fn apply(
        &self,
        clock: &Clock,
        scheduler: &mut ProtocolScheduler,
        log: &mut EventLog,
        side: Position,
        angle: u32,
    ) -> Result<LogEntry, ProtocolError> {
        ProtocolError::check_range(
            "override angle_degrees",
            i64::from(angle),
            i64::from(*self.angle_range.start()),
            i64::from(*self.angle_range.end()),
        )?;

        let now = clock.now();
        let entry = log.append(LogEntry::manual(now, side, angle)).clone();
        scheduler.record_applied(side, angle);

        info!(
            side = %side,
            angle_degrees = angle,
            at = %now.format(TIMESTAMP_FORMAT),
            "Manual change applied"
        );
        Ok(entry)
    }

    /// Like [`apply`](Self::apply) but takes the side as text, as typed by an
    /// operator.
    pub fn apply_named(
        &self,
        clock: &Clock,
        scheduler: &mut ProtocolScheduler,
        log: &mut EventLog,
        side: &str,
        angle: u32,
    ) -> Result<LogEntry, ProtocolError> {
        let side: Position = side.parse()?;
        self.apply(clock, scheduler, log, side, angle)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

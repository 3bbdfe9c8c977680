/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-bed session: clock, scheduler, event log and override controller.
//!
//! A [`Session`] is created when a bed's simulation starts and lives until the
//! caller drops it.  Every interaction is one explicit method call; there is
//! no background timer.  [`Session::advance`] moves the clock and then runs the
//! due check, which is the only order the presentation layer ever uses.
//!
//! Concurrency: [`SharedSession`] puts the whole aggregate behind a single
//! `Mutex`, so a due check can never interleave with an override or a timer
//! reset on the same bed.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::clock::{Clock, TIMESTAMP_FORMAT};
use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::event_log::{EventLog, LogCodecError, LogEntry};
use crate::manual_override::OverrideController;
use crate::position::Position;
use crate::scheduler::{ChangeStatus, ProtocolScheduler, Upcoming};

/// Everything a renderer needs for one frame, serialisable as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub now: NaiveDateTime,
    pub next_change_at: NaiveDateTime,
    pub upcoming: Upcoming,
    pub status: ChangeStatus,
    pub last_side: Position,
    pub last_angle: u32,
    pub log_len: usize,
}

/// An isolated simulation of one bed.
#[derive(Debug, Clone)]
pub struct Session {
    clock: Clock,
    scheduler: ProtocolScheduler,
    log: EventLog,
    overrides: OverrideController,
}

impl Session {
    /// Start a session at `start` with the given protocol.
    pub fn new(config: ProtocolConfig, start: NaiveDateTime) -> Self {
        Self::with_clock(config, Clock::new(start))
    }

    pub fn with_clock(config: ProtocolConfig, clock: Clock) -> Self {
        info!(
            start = %clock.now().format(TIMESTAMP_FORMAT),
            "Session started"
        );
        let scheduler = ProtocolScheduler::new(config, &clock);
        Self {
            clock,
            scheduler,
            log: EventLog::new(),
            overrides: OverrideController::new(),
        }
    }

    // ── Read access ───────────────────────────────────────────────────────────

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn scheduler(&self) -> &ProtocolScheduler {
        &self.scheduler
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn status(&self) -> ChangeStatus {
        self.scheduler.status(&self.clock)
    }

    pub fn peek_upcoming(&self) -> Upcoming {
        self.scheduler.peek_upcoming()
    }

    pub fn view(&self) -> SessionView {
        let state = self.scheduler.state();
        SessionView {
            now: self.clock.now(),
            next_change_at: state.next_change_at,
            upcoming: self.scheduler.peek_upcoming(),
            status: self.status(),
            last_side: state.last_side,
            last_angle: state.last_angle,
            log_len: self.log.len(),
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Advance the clock by `minutes`, then fire the pending change if due.
    ///
    /// # Errors
    /// [`ProtocolError::NonPositiveAdvance`] or
    /// [`ProtocolError::AdvanceOverflow`]; the session is unchanged.
    pub fn advance(&mut self, minutes: i64) -> Result<Option<LogEntry>, ProtocolError> {
        self.clock.advance(minutes)?;
        Ok(self.check_and_apply())
    }

    /// Run the due check at the current time (used on initial load).
    pub fn check_and_apply(&mut self) -> Option<LogEntry> {
        self.scheduler.check_and_apply(&self.clock, &mut self.log)
    }

    pub fn reset_timer(&mut self) {
        self.scheduler.reset_timer(&self.clock);
    }

    pub fn apply_override(&mut self, side: Position, angle: u32) -> Result<LogEntry, ProtocolError> {
        self.overrides
            .apply(&self.clock, &mut self.scheduler, &mut self.log, side, angle)
    }

    /// Change the protocol; see [`ProtocolScheduler::reconfigure`].
    pub fn reconfigure<T>(&mut self, f: impl FnOnce(&mut ProtocolConfig) -> T) -> T {
        self.scheduler.reconfigure(f)
    }

    pub fn export_csv(&self) -> Result<Vec<u8>, LogCodecError> {
        self.log.export_csv()
    }

    /// Move the clock without running the due check.
    #[cfg(test)]
    pub(crate) fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}

// ── SharedSession ─────────────────────────────────────────────────────────────

/// Thread-safe session handle: one lock per bed.
#[derive(Debug)]
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Run `f` with exclusive access to the session.
    ///
    /// A panic inside an earlier holder does not lock the bed out: the
    /// session's own operations never leave partial state, so the guard is
    /// recovered from a poisoned lock.
    pub fn with<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    pub fn advance(&self, minutes: i64) -> Result<Option<LogEntry>, ProtocolError> {
        self.with(|s| s.advance(minutes))
    }

    pub fn reset_timer(&self) {
        self.with(Session::reset_timer)
    }

    pub fn apply_override(&self, side: Position, angle: u32) -> Result<LogEntry, ProtocolError> {
        self.with(|s| s.apply_override(side, angle))
    }

    pub fn view(&self) -> SessionView {
        self.lock().view()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

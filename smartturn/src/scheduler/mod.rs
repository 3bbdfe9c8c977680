//! Turn-protocol scheduler.
//!
//! [`ProtocolScheduler`] owns the [`ProtocolConfig`] and the rotation state
//! ([`SchedulerState`]) and decides when an automatic position change is due.
//! It never reads host time: every operation takes the session [`Clock`] by
//! shared reference and the [`EventLog`] by exclusive reference, so the caller
//! decides when time moves and where history goes.
//!
//! # Status
//! The due/late status is derived, not stored:
//!
//! | Status | Condition |
//! |---|---|
//! | `OnTime` | `now < next_change_at` |
//! | `Due` | `next_change_at ≤ now ≤ next_change_at + grace` |
//! | `Late` | `now > next_change_at + grace` |
//!
//! # Firing
//! [`check_and_apply`](ProtocolScheduler::check_and_apply) fires at most once
//! per clock position.  After firing, `next_change_at` is measured from the
//! firing time, not from the original due time, so a missed interval is
//! absorbed rather than caught up.
//!
//! # Example
//! ```rust
//! use chrono::NaiveDate;
//! use smartturn::clock::Clock;
//! use smartturn::config::ProtocolConfig;
//! use smartturn::event_log::EventLog;
//! use smartturn::scheduler::ProtocolScheduler;
//!
//! let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
//! let mut clock = Clock::new(start);
//! let mut log = EventLog::new();
//! let mut scheduler = ProtocolScheduler::new(ProtocolConfig::default(), &clock);
//!
//! clock.advance(120).unwrap();
//! let fired = scheduler.check_and_apply(&clock, &mut log);
//! assert!(fired.is_some());
//! assert_eq!(log.len(), 1);
//! ```

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, TIMESTAMP_FORMAT};
use crate::config::ProtocolConfig;
use crate::event_log::{EventLog, LogEntry};
use crate::position::Position;

// ── Derived status ────────────────────────────────────────────────────────────

/// Where the clock stands relative to the next scheduled change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    OnTime,
    Due,
    Late,
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeStatus::OnTime => "ON_TIME",
            ChangeStatus::Due => "DUE",
            ChangeStatus::Late => "LATE",
        })
    }
}

/// Side and angle the next automatic change will apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Upcoming {
    pub side: Position,
    pub angle_degrees: u32,
}

// ── SchedulerState ────────────────────────────────────────────────────────────

/// Rotation state of one bed.
///
/// Only the scheduler writes `sequence_index` and `next_change_at`; the
/// override path may also set `last_side` / `last_angle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    /// Index into the config sequence of the side applied next.
    pub sequence_index: usize,
    /// When the next automatic change is due.
    pub next_change_at: NaiveDateTime,
    /// Side most recently applied (auto or manual).
    pub last_side: Position,
    /// Angle most recently applied; `0` until the first change.
    pub last_angle: u32,
}

// ── ProtocolScheduler ─────────────────────────────────────────────────────────

/// Rotation and due/late logic for a single bed.
#[derive(Debug, Clone)]
pub struct ProtocolScheduler {
    config: ProtocolConfig,
    state: SchedulerState,
}

impl ProtocolScheduler {
    /// Start a protocol at the clock's current time.
    ///
    /// The first change is due one interval from now; the bed starts flat on
    /// its back at 0°.
    pub fn new(config: ProtocolConfig, clock: &Clock) -> Self {
        let next_change_at = after(clock.now(), config.interval_minutes());
        info!(
            interval_minutes = config.interval_minutes(),
            angle_degrees = config.angle_degrees(),
            sequence = ?config.sequence(),
            grace_minutes = config.grace_minutes(),
            next_change_at = %next_change_at.format(TIMESTAMP_FORMAT),
            "Protocol scheduler started"
        );
        Self {
            config,
            state: SchedulerState {
                sequence_index: 0,
                next_change_at,
                last_side: Position::Back,
                last_angle: 0,
            },
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Change the configuration in place.
    ///
    /// `f` sees the live config and may call any of its setters; whatever it
    /// returns is passed through.  Afterwards the rotation index is brought
    /// back inside the (possibly shorter) sequence by restarting at 0.
    /// `next_change_at` is not touched: a new interval takes effect at the
    /// next firing or [`reset_timer`](Self::reset_timer).
    pub fn reconfigure<T>(&mut self, f: impl FnOnce(&mut ProtocolConfig) -> T) -> T {
        let out = f(&mut self.config);
        if self.state.sequence_index >= self.config.sequence().len() {
            debug!(
                old_index = self.state.sequence_index,
                len = self.config.sequence().len(),
                "Sequence shrank below rotation index, restarting at 0"
            );
            self.state.sequence_index = 0;
        }
        out
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Side and angle of the next automatic change.  Does not mutate.
    pub fn peek_upcoming(&self) -> Upcoming {
        Upcoming {
            side: self.config.sequence()[self.state.sequence_index],
            angle_degrees: self.config.angle_degrees(),
        }
    }

    /// Status at the clock's current reading.
    pub fn status(&self, clock: &Clock) -> ChangeStatus {
        self.status_at(clock.now())
    }

    /// Status at an arbitrary instant.
    pub fn status_at(&self, now: NaiveDateTime) -> ChangeStatus {
        let due = self.state.next_change_at;
        let late_after = after(due, self.config.grace_minutes());
        if now < due {
            ChangeStatus::OnTime
        } else if now <= late_after {
            ChangeStatus::Due
        } else {
            ChangeStatus::Late
        }
    }

    // ── Mutations ─────────────────────────────────────────────────────────────

    /// Restart the interval from now.  No rotation, no log entry.
    pub fn reset_timer(&mut self, clock: &Clock) {
        self.state.next_change_at = after(clock.now(), self.config.interval_minutes());
        info!(
            next_change_at = %self.state.next_change_at.format(TIMESTAMP_FORMAT),
            "Protocol timer reset"
        );
    }

    /// Fire the pending automatic change if it is due.
    ///
    /// Returns a copy of the logged entry when a change fired, `None` when
    /// nothing was due.  Calling this again without advancing the clock is a
    /// no-op because `next_change_at` has moved past `now`.
    pub fn check_and_apply(&mut self, clock: &Clock, log: &mut EventLog) -> Option<LogEntry> {
        let now = clock.now();
        if now < self.state.next_change_at {
            debug!(
                now = %now.format(TIMESTAMP_FORMAT),
                next_change_at = %self.state.next_change_at.format(TIMESTAMP_FORMAT),
                "No change due"
            );
            return None;
        }

        if self.status_at(now) == ChangeStatus::Late {
            warn!(
                due = %self.state.next_change_at.format(TIMESTAMP_FORMAT),
                grace_minutes = self.config.grace_minutes(),
                now = %now.format(TIMESTAMP_FORMAT),
                "Position change is LATE (past due + grace)"
            );
        }

        let Upcoming {
            side,
            angle_degrees,
        } = self.peek_upcoming();
        let entry = log.append(LogEntry::auto(now, side, angle_degrees)).clone();

        self.record_applied(side, angle_degrees);
        self.state.sequence_index = (self.state.sequence_index + 1) % self.config.sequence().len();
        self.state.next_change_at = after(now, self.config.interval_minutes());

        info!(
            side = %side,
            angle_degrees,
            at = %now.format(TIMESTAMP_FORMAT),
            next_change_at = %self.state.next_change_at.format(TIMESTAMP_FORMAT),
            "Auto change executed"
        );
        Some(entry)
    }

    /// Record the side/angle the bed is now in without touching the rotation.
    pub(crate) fn record_applied(&mut self, side: Position, angle: u32) {
        self.state.last_side = side;
        self.state.last_angle = angle;
    }
}

/// `t + m` minutes, pinned to the last representable instant.
///
/// `Clock::advance` keeps enough headroom that this only saturates for a
/// clock constructed right at the end of the calendar.
fn after(t: NaiveDateTime, m: u32) -> NaiveDateTime {
    t.checked_add_signed(Duration::minutes(i64::from(m)))
        .unwrap_or(NaiveDateTime::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::{EventKind, Mode};
    use chrono::NaiveDate;

    // ── Test helpers ──────────────────────────────────────────────────────────

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn plus(m: i64) -> NaiveDateTime {
        start() + Duration::minutes(m)
    }

    /// interval=120, angle=15, RIGHT → LEFT → BACK, grace=5.
    fn setup() -> (Clock, ProtocolScheduler, EventLog) {
        let clock = Clock::new(start());
        let sched = ProtocolScheduler::new(ProtocolConfig::default(), &clock);
        (clock, sched, EventLog::new())
    }

    fn with_config(config: ProtocolConfig) -> (Clock, ProtocolScheduler, EventLog) {
        let clock = Clock::new(start());
        let sched = ProtocolScheduler::new(config, &clock);
        (clock, sched, EventLog::new())
    }

    // ── Initial state ─────────────────────────────────────────────────────────

    #[test]
    fn initial_state_is_back_at_zero_due_after_one_interval() {
        let (_, sched, _) = setup();
        let s = sched.state();
        assert_eq!(s.sequence_index, 0);
        assert_eq!(s.next_change_at, plus(120));
        assert_eq!(s.last_side, Position::Back);
        assert_eq!(s.last_angle, 0);
    }

    #[test]
    fn initial_check_is_a_noop() {
        let (clock, mut sched, mut log) = setup();
        assert!(sched.check_and_apply(&clock, &mut log).is_none());
        assert!(log.is_empty());
    }

    // ── peek_upcoming ─────────────────────────────────────────────────────────

    #[test]
    fn peek_upcoming_reports_current_index_without_mutating() {
        let (_, sched, _) = setup();
        let before = sched.state().clone();
        let up = sched.peek_upcoming();
        assert_eq!(
            up,
            Upcoming {
                side: Position::Right,
                angle_degrees: 15
            }
        );
        assert_eq!(sched.state(), &before);
    }

    // ── Status boundaries ─────────────────────────────────────────────────────

    #[test]
    fn status_boundaries() {
        let (_, sched, _) = setup();
        assert_eq!(sched.status_at(plus(119)), ChangeStatus::OnTime);
        assert_eq!(sched.status_at(plus(120)), ChangeStatus::Due);
        assert_eq!(sched.status_at(plus(125)), ChangeStatus::Due);
        assert_eq!(sched.status_at(plus(126)), ChangeStatus::Late);
    }

    #[test]
    fn zero_grace_goes_late_one_minute_after_due() {
        let cfg = ProtocolConfig::new(120, 15, vec![Position::Right], 0).unwrap();
        let (_, sched, _) = with_config(cfg);
        assert_eq!(sched.status_at(plus(120)), ChangeStatus::Due);
        assert_eq!(sched.status_at(plus(121)), ChangeStatus::Late);
    }

    #[test]
    fn status_display_names() {
        assert_eq!(ChangeStatus::OnTime.to_string(), "ON_TIME");
        assert_eq!(ChangeStatus::Due.to_string(), "DUE");
        assert_eq!(ChangeStatus::Late.to_string(), "LATE");
    }

    // ── check_and_apply ───────────────────────────────────────────────────────

    #[test]
    fn fires_exactly_at_due_time() {
        let (mut clock, mut sched, mut log) = setup();
        clock.advance(120).unwrap();
        let entry = sched.check_and_apply(&clock, &mut log).unwrap();

        assert_eq!(entry.timestamp(), plus(120));
        assert_eq!(entry.kind(), EventKind::ChangePosition);
        assert_eq!(entry.side(), Position::Right);
        assert_eq!(entry.angle(), 15);
        assert_eq!(entry.mode(), Mode::Auto);
        assert_eq!(entry.status(), "OK");

        let s = sched.state();
        assert_eq!(s.sequence_index, 1);
        assert_eq!(s.next_change_at, plus(240));
        assert_eq!(s.last_side, Position::Right);
        assert_eq!(s.last_angle, 15);
    }

    #[test]
    fn noop_before_due() {
        let (mut clock, mut sched, mut log) = setup();
        clock.advance(119).unwrap();
        let before = sched.state().clone();
        assert!(sched.check_and_apply(&clock, &mut log).is_none());
        assert!(log.is_empty());
        assert_eq!(sched.state(), &before);
    }

    #[test]
    fn repeated_check_without_advance_fires_once() {
        let (mut clock, mut sched, mut log) = setup();
        clock.advance(130).unwrap();
        assert!(sched.check_and_apply(&clock, &mut log).is_some());
        for _ in 0..5 {
            assert!(sched.check_and_apply(&clock, &mut log).is_none());
        }
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn late_firing_measures_next_interval_from_firing_time() {
        let (mut clock, mut sched, mut log) = setup();
        clock.advance(126).unwrap();
        assert_eq!(sched.status(&clock), ChangeStatus::Late);
        sched.check_and_apply(&clock, &mut log).unwrap();
        // No catch-up: 126 + 120, not 120 + 120
        assert_eq!(sched.state().next_change_at, plus(246));
        assert_eq!(sched.status(&clock), ChangeStatus::OnTime);
    }

    #[test]
    fn missed_intervals_fire_only_once() {
        let (mut clock, mut sched, mut log) = setup();
        clock.advance(600).unwrap();
        sched.check_and_apply(&clock, &mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(sched.state().sequence_index, 1);
    }

    #[test]
    fn rotation_is_cyclic_and_order_preserving() {
        let seq = vec![Position::Left, Position::Back, Position::Left, Position::Right];
        let cfg = ProtocolConfig::new(10, 20, seq.clone(), 0).unwrap();
        let (mut clock, mut sched, mut log) = with_config(cfg);

        for _ in 0..(seq.len() * 3) {
            clock.advance(10).unwrap();
            sched.check_and_apply(&clock, &mut log).unwrap();
        }

        let visited: Vec<Position> = log.entries().iter().map(|e| e.side()).collect();
        let expected: Vec<Position> = seq.iter().copied().cycle().take(seq.len() * 3).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn single_side_sequence_stays_on_that_side() {
        let cfg = ProtocolConfig::new(10, 5, vec![Position::Back], 0).unwrap();
        let (mut clock, mut sched, mut log) = with_config(cfg);
        for _ in 0..3 {
            clock.advance(10).unwrap();
            sched.check_and_apply(&clock, &mut log).unwrap();
            assert_eq!(sched.state().sequence_index, 0);
        }
        assert!(log.entries().iter().all(|e| e.side() == Position::Back));
    }

    // ── reset_timer ───────────────────────────────────────────────────────────

    #[test]
    fn reset_timer_moves_only_next_change_at() {
        let (mut clock, mut sched, mut log) = setup();
        clock.advance(120).unwrap();
        sched.check_and_apply(&clock, &mut log).unwrap();
        clock.advance(60).unwrap();

        let before = sched.state().clone();
        sched.reset_timer(&clock);
        let after = sched.state();

        assert_eq!(after.next_change_at, plus(300));
        assert_eq!(after.sequence_index, before.sequence_index);
        assert_eq!(after.last_side, before.last_side);
        assert_eq!(after.last_angle, before.last_angle);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn reset_timer_clears_lateness() {
        let (mut clock, mut sched, _) = setup();
        clock.advance(200).unwrap();
        assert_eq!(sched.status(&clock), ChangeStatus::Late);
        sched.reset_timer(&clock);
        assert_eq!(sched.status(&clock), ChangeStatus::OnTime);
    }

    #[test]
    fn start_at_end_of_calendar_does_not_overflow() {
        let clock = Clock::new(NaiveDateTime::MAX);
        let mut sched = ProtocolScheduler::new(ProtocolConfig::default(), &clock);
        let mut log = EventLog::new();
        assert_eq!(sched.state().next_change_at, NaiveDateTime::MAX);
        assert_eq!(sched.status(&clock), ChangeStatus::OnTime);
        sched.reset_timer(&clock);
        assert!(sched.check_and_apply(&clock, &mut log).is_none());
    }

    // ── reconfigure ───────────────────────────────────────────────────────────

    #[test]
    fn shrinking_sequence_restarts_index() {
        let (mut clock, mut sched, mut log) = setup();
        for _ in 0..2 {
            clock.advance(120).unwrap();
            sched.check_and_apply(&clock, &mut log).unwrap();
        }
        assert_eq!(sched.state().sequence_index, 2);

        let applied = sched.reconfigure(|c| c.set_sequence(vec![Position::Left, Position::Right]));
        assert!(applied);
        assert_eq!(sched.state().sequence_index, 0);
        assert_eq!(sched.peek_upcoming().side, Position::Left);
    }

    #[test]
    fn empty_sequence_reconfigure_is_ignored() {
        let (_, mut sched, _) = setup();
        let applied = sched.reconfigure(|c| c.set_sequence(Vec::new()));
        assert!(!applied);
        assert_eq!(sched.config().sequence().len(), 3);
    }

    #[test]
    fn interval_change_applies_from_next_firing() {
        let (mut clock, mut sched, mut log) = setup();
        sched.reconfigure(|c| c.set_interval_minutes(30)).unwrap();
        assert_eq!(sched.state().next_change_at, plus(120));

        clock.advance(120).unwrap();
        sched.check_and_apply(&clock, &mut log).unwrap();
        assert_eq!(sched.state().next_change_at, plus(150));
    }

    #[test]
    fn angle_change_is_used_by_next_firing() {
        let (mut clock, mut sched, mut log) = setup();
        sched.reconfigure(|c| c.set_angle_degrees(25)).unwrap();
        clock.advance(120).unwrap();
        let entry = sched.check_and_apply(&clock, &mut log).unwrap();
        assert_eq!(entry.angle(), 25);
    }

    #[test]
    fn rejected_reconfigure_leaves_config_unchanged() {
        let (_, mut sched, _) = setup();
        assert!(sched.reconfigure(|c| c.set_grace_minutes(99)).is_err());
        assert_eq!(sched.config(), &ProtocolConfig::default());
    }
}

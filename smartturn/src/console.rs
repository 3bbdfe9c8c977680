/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Line-oriented command console over a [`Session`].
//!
//! Each line is one operator action.  Blank lines and `#` comments are
//! skipped.
//!
//! ```text
//! advance <minutes>          move the clock, then run the due check
//! check                      run the due check without moving the clock
//! reset                      restart the protocol timer from now
//! override <SIDE> <ANGLE>    manual position change
//! set interval <minutes>     10..=480
//! set angle <degrees>        5..=30
//! set grace <minutes>        0..=60
//! set sequence <SIDE,...>    e.g. RIGHT,LEFT,BACK (empty list ignored)
//! status                     current time, due time, upcoming side, status
//! log                        event log table
//! pose                       what the bed renderer would show
//! export [PATH]              write the CSV log (default smartturn_log.csv)
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::clock::TIMESTAMP_FORMAT;
use crate::error::ProtocolError;
use crate::event_log::{LogEntry, EXPORT_FILE_NAME};
use crate::pose::{BedView, DisplayOptions};
use crate::position::{parse_sequence, Position};
use crate::scheduler::ChangeStatus;
use crate::session::Session;

// ── Command ───────────────────────────────────────────────────────────────────

/// Protocol setting addressed by `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Interval,
    Angle,
    Grace,
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Advance(i64),
    Check,
    Reset,
    Override { side: Position, angle: u32 },
    Set { setting: Setting, value: u32 },
    SetSequence(Vec<Position>),
    Status,
    Log,
    Pose,
    Export(PathBuf),
}

impl Command {
    /// Parse one line; `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> Result<Option<Command>, ProtocolError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let malformed = |reason: &str| ProtocolError::MalformedCommand {
            line: trimmed.to_string(),
            reason: reason.to_string(),
        };
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let verb = words[0].to_ascii_lowercase();
        let args = &words[1..];

        let cmd = match (verb.as_str(), args) {
            ("advance", [n]) => {
                Command::Advance(n.parse().map_err(|_| malformed("minutes must be an integer"))?)
            }
            ("check", []) => Command::Check,
            ("reset", []) => Command::Reset,
            ("override", [side, angle]) => Command::Override {
                side: side.parse()?,
                angle: angle
                    .parse()
                    .map_err(|_| malformed("angle must be a non-negative integer"))?,
            },
            ("set", [name, rest @ ..]) if name.eq_ignore_ascii_case("sequence") => {
                Command::SetSequence(parse_sequence(&rest.join(","))?)
            }
            ("set", [name, value]) => {
                let setting = match name.to_ascii_lowercase().as_str() {
                    "interval" => Setting::Interval,
                    "angle" => Setting::Angle,
                    "grace" => Setting::Grace,
                    _ => return Err(malformed("unknown setting")),
                };
                let value = value
                    .parse()
                    .map_err(|_| malformed("value must be a non-negative integer"))?;
                Command::Set { setting, value }
            }
            ("status", []) => Command::Status,
            ("log", []) => Command::Log,
            ("pose", []) => Command::Pose,
            ("export", []) => Command::Export(PathBuf::from(EXPORT_FILE_NAME)),
            ("export", [path]) => Command::Export(PathBuf::from(path)),
            (
                "advance" | "check" | "reset" | "override" | "set" | "status" | "log" | "pose"
                | "export",
                _,
            ) => return Err(malformed("wrong number of arguments")),
            _ => return Err(malformed("unknown command")),
        };
        Ok(Some(cmd))
    }
}

// ── Console ───────────────────────────────────────────────────────────────────

/// Drives a [`Session`] from parsed commands and prints operator feedback.
pub struct Console {
    session: Session,
    display: DisplayOptions,
}

impl Console {
    pub fn new(session: Session, display: DisplayOptions) -> Self {
        Self { session, display }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Initial-load due check, reported like any other firing.
    pub fn start<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let fired = self.session.check_and_apply();
        report_auto_change(out, fired.as_ref())
    }

    /// Parse and execute one line.
    ///
    /// A rejected command returns an error and leaves the session unchanged.
    pub fn run_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        match Command::parse(line)? {
            Some(cmd) => self.execute(cmd, out),
            None => Ok(()),
        }
    }

    pub fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<()> {
        debug!(?cmd, "Executing console command");
        match cmd {
            Command::Advance(minutes) => {
                let fired = self.session.advance(minutes)?;
                report_auto_change(out, fired.as_ref())?;
                self.write_status(out)?;
            }
            Command::Check => {
                let fired = self.session.check_and_apply();
                report_auto_change(out, fired.as_ref())?;
            }
            Command::Reset => {
                self.session.reset_timer();
                writeln!(out, "Protocol timer reset.")?;
            }
            Command::Override { side, angle } => {
                let entry = self.session.apply_override(side, angle)?;
                writeln!(
                    out,
                    "Manual change applied → {} at {}°",
                    entry.side(),
                    entry.angle()
                )?;
            }
            Command::Set { setting, value } => {
                self.session.reconfigure(|c| match setting {
                    Setting::Interval => c.set_interval_minutes(value),
                    Setting::Angle => c.set_angle_degrees(value),
                    Setting::Grace => c.set_grace_minutes(value),
                })?;
                writeln!(out, "{setting:?} set to {value}.")?;
            }
            Command::SetSequence(sequence) => {
                if self.session.reconfigure(|c| c.set_sequence(sequence)) {
                    let names: Vec<&str> = self
                        .session
                        .scheduler()
                        .config()
                        .sequence()
                        .iter()
                        .map(|p| p.as_str())
                        .collect();
                    writeln!(out, "Sequence set to {}.", names.join(", "))?;
                } else {
                    warn!("Empty sequence ignored");
                    writeln!(out, "Empty sequence ignored.")?;
                }
            }
            Command::Status => self.write_status(out)?,
            Command::Log => self.write_log(out)?,
            Command::Pose => {
                let state = self.session.scheduler().state();
                let view = BedView::from_state(state.last_side, state.last_angle, self.display);
                writeln!(out, "{}", view.caption())?;
            }
            Command::Export(path) => {
                self.session
                    .log()
                    .export_to_file(&path)
                    .with_context(|| format!("Failed to export log to {}", path.display()))?;
                writeln!(
                    out,
                    "Exported {} entries to {}",
                    self.session.log().len(),
                    path.display()
                )?;
            }
        }
        Ok(())
    }

    fn write_status<W: Write>(&self, out: &mut W) -> Result<()> {
        let v = self.session.view();
        writeln!(
            out,
            "Current simulated time: {}  |  Next change due at: {}  |  Upcoming side: {} • Angle: {}°",
            v.now.format(TIMESTAMP_FORMAT),
            v.next_change_at.format(TIMESTAMP_FORMAT),
            v.upcoming.side,
            v.upcoming.angle_degrees,
        )?;
        match v.status {
            ChangeStatus::Late => writeln!(out, "Change is LATE! (past due + grace)")?,
            ChangeStatus::Due => writeln!(out, "Change is due now.")?,
            ChangeStatus::OnTime => {}
        }
        Ok(())
    }

    fn write_log<W: Write>(&self, out: &mut W) -> Result<()> {
        let log = self.session.log();
        if log.is_empty() {
            writeln!(out, "(event log is empty)")?;
            return Ok(());
        }
        for entry in log.entries() {
            writeln!(out, "{entry}")?;
        }
        Ok(())
    }
}

fn report_auto_change<W: Write>(out: &mut W, fired: Option<&LogEntry>) -> Result<()> {
    if let Some(entry) = fired {
        writeln!(
            out,
            "Auto change executed → {} at {}°",
            entry.side(),
            entry.angle()
        )?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Turn-protocol configuration loading and validation.
//!
//! [`ProtocolConfig`] is a plain record with range-validated setters.  Values
//! outside their bounds are **rejected** (never clamped) and the previous
//! value is kept, so a bad input can never leave a half-applied config.
//!
//! The expected YAML structure is:
//! ```yaml
//! protocol:
//!   interval_minutes: 120
//!   angle_degrees: 15
//!   sequence: [RIGHT, LEFT, BACK]
//!   grace_minutes: 5
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ProtocolError;
use crate::position::Position;

// ── Bounds ────────────────────────────────────────────────────────────────────

/// Allowed interval between automatic changes, in minutes.
pub const INTERVAL_MINUTES_RANGE: (u32, u32) = (10, 480);

/// Allowed tilt angle, in degrees.
pub const ANGLE_DEGREES_RANGE: (u32, u32) = (5, 30);

/// Allowed grace period before a due change counts as late, in minutes.
pub const GRACE_MINUTES_RANGE: (u32, u32) = (0, 60);

pub const DEFAULT_INTERVAL_MINUTES: u32 = 120;
pub const DEFAULT_ANGLE_DEGREES: u32 = 15;
pub const DEFAULT_GRACE_MINUTES: u32 = 5;

fn default_sequence() -> Vec<Position> {
    vec![Position::Right, Position::Left, Position::Back]
}

fn check(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), ProtocolError> {
    ProtocolError::check_range(field, i64::from(value), i64::from(min), i64::from(max))
}

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Deserialize)]
struct ProtocolConfigFile {
    #[serde(default)]
    protocol: ProtocolEntry,
}

/// Protocol fields as they appear in the YAML file.  Every field is optional;
/// missing values fall back to the defaults of a fresh session.
#[derive(Debug, Default, Deserialize)]
struct ProtocolEntry {
    interval_minutes: Option<u32>,
    angle_degrees: Option<u32>,
    sequence: Option<Vec<Position>>,
    grace_minutes: Option<u32>,
}

// ── ProtocolConfig ────────────────────────────────────────────────────────────

/// Interval, angle, side order and lateness grace for one bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolConfig {
    interval_minutes: u32,
    angle_degrees: u32,
    sequence: Vec<Position>,
    grace_minutes: u32,
}

impl Default for ProtocolConfig {
    /// 120 min, 15°, RIGHT → LEFT → BACK, 5 min grace.
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            angle_degrees: DEFAULT_ANGLE_DEGREES,
            sequence: default_sequence(),
            grace_minutes: DEFAULT_GRACE_MINUTES,
        }
    }
}

impl ProtocolConfig {
    /// Build a validated config.
    ///
    /// # Errors
    /// [`ProtocolError::OutOfRange`] for any bounded field outside its range,
    /// [`ProtocolError::EmptySequence`] for an empty side list.
    pub fn new(
        interval_minutes: u32,
        angle_degrees: u32,
        sequence: Vec<Position>,
        grace_minutes: u32,
    ) -> Result<Self, ProtocolError> {
        check("interval_minutes", interval_minutes, INTERVAL_MINUTES_RANGE)?;
        check("angle_degrees", angle_degrees, ANGLE_DEGREES_RANGE)?;
        check("grace_minutes", grace_minutes, GRACE_MINUTES_RANGE)?;
        if sequence.is_empty() {
            return Err(ProtocolError::EmptySequence);
        }
        Ok(Self {
            interval_minutes,
            angle_degrees,
            sequence,
            grace_minutes,
        })
    }

    /// Parse and validate a YAML protocol file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is structurally
    /// invalid, or a value fails validation.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading protocol configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid protocol configuration: {}", path.display()))
    }

    /// Parse and validate YAML text in the layout shown in the module docs.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ProtocolConfigFile =
            serde_yaml::from_str(content).context("Failed to parse protocol YAML")?;
        let entry = file.protocol;

        if entry.sequence.is_none() {
            debug!("No sequence in configuration, using RIGHT, LEFT, BACK");
        }

        let config = Self::new(
            entry.interval_minutes.unwrap_or(DEFAULT_INTERVAL_MINUTES),
            entry.angle_degrees.unwrap_or(DEFAULT_ANGLE_DEGREES),
            entry.sequence.unwrap_or_else(default_sequence),
            entry.grace_minutes.unwrap_or(DEFAULT_GRACE_MINUTES),
        )?;

        info!(
            interval_minutes = config.interval_minutes,
            angle_degrees = config.angle_degrees,
            sequence = ?config.sequence,
            grace_minutes = config.grace_minutes,
            "Protocol configuration loaded"
        );
        Ok(config)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn angle_degrees(&self) -> u32 {
        self.angle_degrees
    }

    /// Side order; never empty.
    pub fn sequence(&self) -> &[Position] {
        &self.sequence
    }

    pub fn grace_minutes(&self) -> u32 {
        self.grace_minutes
    }

    // ── Setters ───────────────────────────────────────────────────────────────

    pub fn set_interval_minutes(&mut self, minutes: u32) -> Result<(), ProtocolError> {
        check("interval_minutes", minutes, INTERVAL_MINUTES_RANGE)?;
        self.interval_minutes = minutes;
        Ok(())
    }

    pub fn set_angle_degrees(&mut self, degrees: u32) -> Result<(), ProtocolError> {
        check("angle_degrees", degrees, ANGLE_DEGREES_RANGE)?;
        self.angle_degrees = degrees;
        Ok(())
    }

    pub fn set_grace_minutes(&mut self, minutes: u32) -> Result<(), ProtocolError> {
        check("grace_minutes", minutes, GRACE_MINUTES_RANGE)?;
        self.grace_minutes = minutes;
        Ok(())
    }

    /// Replace the side order.
    ///
    /// An empty list is ignored and the previous order kept; returns whether
    /// the new order was applied.
    pub fn set_sequence(&mut self, sequence: Vec<Position>) -> bool {
        if sequence.is_empty() {
            warn!("Ignoring empty position sequence, keeping {:?}", self.sequence);
            return false;
        }
        self.sequence = sequence;
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

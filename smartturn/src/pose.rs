/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Bed pose descriptor handed to a renderer.
//!
//! The core does not draw anything.  It tells the renderer *what* to show for
//! the bed's current side and angle:
//!
//! * angle `0` (no change applied yet) → the static reference photo;
//! * otherwise a schematic: RIGHT / LEFT tilt the whole frame, BACK raises
//!   the backrest.  Angles are multiplied by a display exaggeration factor so
//!   small tilts stay visible.

use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::error::ProtocolError;
use crate::position::Position;

/// Allowed display exaggeration factors.
pub const EXAGGERATION_RANGE: (u32, u32) = (1, 4);

pub const DEFAULT_EXAGGERATION: u32 = 2;

/// What the renderer should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum BedView {
    /// Flat bed: show the reference photo instead of a schematic.
    ReferencePhoto,
    /// Schematic drawing parameters, all in degrees.
    Schematic {
        side: Position,
        /// Angle as applied to the bed.
        angle_degrees: u32,
        /// `angle_degrees × exaggeration`.
        display_angle: u32,
        /// Signed frame rotation: positive for RIGHT, negative for LEFT.
        frame_tilt: i32,
        /// Backrest raise, BACK only.
        backrest_angle: u32,
        /// Draw the backrest arc and arrow.
        show_guides: bool,
    },
}

/// Display options for [`BedView::from_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    exaggeration: u32,
    pub show_guides: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            exaggeration: DEFAULT_EXAGGERATION,
            show_guides: true,
        }
    }
}

impl DisplayOptions {
    pub fn new(exaggeration: u32, show_guides: bool) -> Result<Self, ProtocolError> {
        let (min, max) = EXAGGERATION_RANGE;
        ProtocolError::check_range(
            "exaggeration",
            i64::from(exaggeration),
            i64::from(min),
            i64::from(max),
        )?;
        Ok(Self {
            exaggeration,
            show_guides,
        })
    }

    pub fn exaggeration(&self) -> u32 {
        self.exaggeration
    }
}

impl BedView {
    /// Describe the bed for the given last-applied side and angle.
    pub fn from_state(side: Position, angle_degrees: u32, opts: DisplayOptions) -> Self {
        if angle_degrees == 0 {
            return BedView::ReferencePhoto;
        }

        let display_angle = angle_degrees * opts.exaggeration;
        // Angles are bounded to a few hundred degrees at most
        let signed = i32::try_from(display_angle).unwrap_or(i32::MAX);
        let (frame_tilt, backrest_angle) = match side {
            Position::Right => (signed, 0),
            Position::Left => (-signed, 0),
            Position::Back => (0, display_angle),
        };

        BedView::Schematic {
            side,
            angle_degrees,
            display_angle,
            frame_tilt,
            backrest_angle,
            show_guides: side == Position::Back && opts.show_guides,
        }
    }

    /// One-line caption in the form the schematic prints under the bed.
    pub fn caption(&self) -> String {
        match self {
            BedView::ReferencePhoto => "Bed flat (reference photo)".to_string(),
            BedView::Schematic {
                side,
                angle_degrees,
                display_angle,
                ..
            } => format!(
                "Side: {side}  •  Display angle: {display_angle}°  (original: {angle_degrees}°)"
            ),
        }
    }
}

/// Check that the reference photo exists.
///
/// A missing image only degrades the display; it never affects the schedule
/// or the log, so this warns and returns `false` instead of failing.
pub fn reference_photo_available(path: &Path) -> bool {
    if path.exists() {
        true
    } else {
        warn!("Photo not found: {}", path.display());
        false
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

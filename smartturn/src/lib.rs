/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! SmartTurn – simulated bed repositioning protocol
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── error            – ProtocolError / ErrorKind
//! ├── position         – RIGHT / LEFT / BACK
//! ├── clock            – simulated minute-resolution clock
//! ├── config/          – ProtocolConfig + YAML loading
//! ├── event_log/       – append-only audit log + CSV export/import
//! ├── scheduler/       – rotation state, due/late logic
//! ├── manual_override  – OverrideController
//! ├── session          – per-bed aggregate + lock-guarded handle
//! ├── pose             – bed view descriptor for renderers
//! └── console          – line-oriented command console
//! ```

pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod event_log;
pub mod manual_override;
pub mod pose;
pub mod position;
pub mod scheduler;
pub mod session;

pub use error::{ErrorKind, ProtocolError};

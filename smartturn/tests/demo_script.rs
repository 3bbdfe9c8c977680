/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Runs the shipped demo protocol and night-shift script through the console.

use smartturn::clock::parse_timestamp;
use smartturn::config::ProtocolConfig;
use smartturn::console::Console;
use smartturn::event_log::{EventLog, Mode};
use smartturn::pose::DisplayOptions;
use smartturn::position::Position;
use smartturn::session::Session;

const PROTOCOL_YAML: &str = include_str!("../demos/protocol.yaml");
const NIGHT_SHIFT: &str = include_str!("../demos/night_shift.txt");

fn run_night_shift() -> (Console, String) {
    let config = ProtocolConfig::from_yaml_str(PROTOCOL_YAML).unwrap();
    let start = parse_timestamp("2025-03-01 22:00").unwrap();
    let mut console = Console::new(Session::new(config, start), DisplayOptions::default());

    let mut out = Vec::new();
    console.start(&mut out).unwrap();
    // Skip the export so the test does not write into the working directory
    for line in NIGHT_SHIFT.lines().filter(|l| !l.starts_with("export")) {
        console.run_line(line, &mut out).unwrap();
    }
    (console, String::from_utf8(out).unwrap())
}

#[test]
fn demo_protocol_matches_defaults() {
    let config = ProtocolConfig::from_yaml_str(PROTOCOL_YAML).unwrap();
    assert_eq!(config, ProtocolConfig::default());
}

#[test]
fn night_shift_produces_expected_log() {
    let (console, _) = run_night_shift();
    let log = console.session().log();

    let rows: Vec<(String, Position, u32, Mode)> = log
        .entries()
        .iter()
        .map(|e| {
            (
                e.timestamp().format("%Y-%m-%d %H:%M").to_string(),
                e.side(),
                e.angle(),
                e.mode(),
            )
        })
        .collect();

    assert_eq!(
        rows,
        vec![
            ("2025-03-02 00:00".to_string(), Position::Right, 15, Mode::Auto),
            ("2025-03-02 01:00".to_string(), Position::Left, 20, Mode::Manual),
            ("2025-03-02 02:00".to_string(), Position::Left, 15, Mode::Auto),
            // Timer was reset at 03:10 and the sequence replaced by LEFT, BACK
            ("2025-03-02 05:10".to_string(), Position::Left, 15, Mode::Auto),
        ]
    );
}

#[test]
fn night_shift_output_reports_changes() {
    let (_, out) = run_night_shift();
    assert!(out.contains("Auto change executed → RIGHT at 15°"), "{out}");
    assert!(out.contains("Manual change applied → LEFT at 20°"), "{out}");
    assert!(out.contains("Protocol timer reset."), "{out}");
    assert!(out.contains("Sequence set to LEFT, BACK."), "{out}");
    assert!(out.contains("Side: RIGHT  •  Display angle: 30°"), "{out}");
}

#[test]
fn night_shift_log_survives_csv_round_trip() {
    let (console, _) = run_night_shift();
    let bytes = console.session().export_csv().unwrap();
    let parsed = EventLog::from_csv_reader(bytes.as_slice()).unwrap();
    assert_eq!(&parsed, console.session().log());
}

/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use tracing::{error, info, warn};

use smartturn::clock::{parse_timestamp, Clock};
use smartturn::config::ProtocolConfig;
use smartturn::console::Console;
use smartturn::pose::{DisplayOptions, DEFAULT_EXAGGERATION};
use smartturn::session::Session;

// ── CLI argument definition ───────────────────────────────────────────────────

/// SmartTurn bed repositioning simulator.
///
/// Reads console commands (one per line) from --script or stdin.
///
/// Example:
///   printf 'advance 60\nadvance 60\nlog\n' | smartturn --start "2025-03-01 08:00"
#[derive(Debug, Parser)]
#[command(
    name = "smartturn",
    about = "SmartTurn – simulated bed repositioning protocol",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML protocol configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Simulated start time, "YYYY-MM-DD HH:MM" (default: local time now).
    #[arg(short = 's', long = "start", value_parser = parse_start)]
    start: Option<NaiveDateTime>,

    /// Command script; stdin when absent.
    #[arg(short = 'f', long = "script")]
    script: Option<PathBuf>,

    /// Write the CSV event log here when the script ends.
    #[arg(short = 'e', long = "export")]
    export: Option<PathBuf>,

    /// Display exaggeration factor for the bed pose (1–4).
    #[arg(short = 'x', long = "exaggeration", default_value_t = DEFAULT_EXAGGERATION)]
    exaggeration: u32,

    /// Hide the backrest guides in the bed pose.
    #[arg(long = "no-guides", default_value_t = false)]
    no_guides: bool,
}

fn parse_start(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).map_err(|e| format!("expected \"YYYY-MM-DD HH:MM\": {e}"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    info!(
        config       = ?cli.config,
        start        = ?cli.start,
        script       = ?cli.script,
        export       = ?cli.export,
        exaggeration = cli.exaggeration,
        "SmartTurn starting up"
    );

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // ── Protocol configuration ────────────────────────────────────────────────
    let config = match &cli.config {
        Some(path) => ProtocolConfig::load_from_file(path)?,
        None => {
            warn!("No protocol configuration file provided, using default protocol");
            ProtocolConfig::default()
        }
    };

    let display = DisplayOptions::new(cli.exaggeration, !cli.no_guides)
        .context("Invalid display options")?;

    let clock = match cli.start {
        Some(start) => Clock::new(start),
        None => Clock::starting_now(),
    };

    let mut console = Console::new(Session::with_clock(config, clock), display);

    // ── Command loop ──────────────────────────────────────────────────────────
    let input: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("Cannot open script file: {}", path.display())
        })?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    console.start(&mut out)?;
    for (lineno, line) in input.lines().enumerate() {
        let line = line.context("Failed to read command input")?;
        // A rejected command leaves the session unchanged; keep going
        if let Err(e) = console.run_line(&line, &mut out) {
            warn!(line = lineno + 1, "{:#}", e);
            writeln!(out, "error: {e:#}")?;
        }
    }

    // ── Final export ──────────────────────────────────────────────────────────
    if let Some(path) = &cli.export {
        console
            .session()
            .log()
            .export_to_file(path)
            .with_context(|| format!("Failed to export log to {}", path.display()))?;
    }

    info!(
        entries = console.session().log().len(),
        "SmartTurn session finished"
    );
    Ok(())
}

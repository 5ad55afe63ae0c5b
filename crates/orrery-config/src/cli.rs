//! Command-line argument parsing for the Orrery engine.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orrery engine command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "orrery", about = "Orrery Engine")]
pub struct CliArgs {
    /// Frame-rate cap in FPS (0 = unlimited).
    #[arg(long)]
    pub fps_limit: Option<f64>,

    /// Update tick rate in Hz (0 = every iteration).
    #[arg(long)]
    pub update_rate: Option<f64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log once-per-second UPS/FPS statistics.
    #[arg(long)]
    pub log_stats: Option<bool>,

    /// Stop after this many engine seconds (0 = run until interrupted).
    #[arg(long)]
    pub auto_close: Option<f64>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(fps) = args.fps_limit {
            self.timing.fps_limit = fps;
        }
        if let Some(rate) = args.update_rate {
            self.timing.update_rate = rate;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(stats) = args.log_stats {
            self.debug.log_stats = stats;
        }
        if let Some(seconds) = args.auto_close {
            self.debug.auto_close_seconds = seconds;
        }
    }
}

//! Headless demo embedding the Orrery engine core.
//!
//! Loads `config.ron`, applies CLI overrides, initializes logging, then
//! registers sample modules and a game and runs the loop until the
//! auto-close watchdog fires (or until interrupted when auto-close is
//! disabled). Presentation is tracing output; there is no window.
//!
//! Run with `cargo run -p orrery-demo`.
//! Run with `cargo run -p orrery-demo -- --fps-limit 30 --auto-close 3` to
//! override the config.

mod game;
mod modules;
mod platform;

use clap::Parser;
use orrery_config::{CliArgs, Config, ConfigError};
use orrery_core::{Engine, RegistryError, Stage};
use tracing::{error, info, warn};

use game::DemoGame;
use modules::{AutoCloseWatchdog, FrameStats, OrbitalSim};

fn load_config(args: &CliArgs, default_dir: &std::path::Path) -> Result<Config, ConfigError> {
    let config_dir = args.config.as_deref().unwrap_or(default_dir);
    let mut config = Config::load_or_create(config_dir)?;
    config.apply_cli_overrides(args);
    Ok(config)
}

fn register_modules(engine: &mut Engine, config: &Config) -> Result<(), RegistryError> {
    if config.debug.auto_close_seconds > 0.0 {
        engine.add_module(
            Stage::Always,
            AutoCloseWatchdog::new(config.debug.auto_close_seconds),
        )?;
    }
    engine.add_module(Stage::Update, OrbitalSim::new())?;
    if config.debug.log_stats {
        engine.add_module(Stage::Render, FrameStats::new())?;
    }
    Ok(())
}

fn main() {
    let args = CliArgs::parse();

    let dirs = match platform::PlatformDirs::resolve_and_create() {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("failed to initialize platform directories: {e}");
            std::process::exit(1);
        }
    };

    let config = match load_config(&args, &dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load config, using defaults: {e}");
            let mut config = Config::default();
            config.apply_cli_overrides(&args);
            config
        }
    };

    orrery_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));

    let argv0 = std::env::args()
        .next()
        .unwrap_or_else(|| "orrery-demo".to_string());
    let mut engine = match Engine::new(argv0) {
        Ok(engine) => engine,
        Err(e) => {
            error!("engine construction failed: {e}");
            std::process::exit(1);
        }
    };

    engine.set_fps_limit(config.timing.fps_limit);
    engine.set_update_rate(config.timing.update_rate);

    if let Err(e) = register_modules(&mut engine, &config) {
        error!("module registration failed: {e}");
        std::process::exit(1);
    }

    // Typed lookup seeds the simulation after registration.
    match engine.get_module_mut::<OrbitalSim>() {
        Some(sim) => {
            sim.add_body("Mercury", 0.39, 88.0);
            sim.add_body("Venus", 0.72, 224.7);
            sim.add_body("Earth", 1.0, 365.25);
            sim.add_body("Mars", 1.52, 687.0);
        }
        None => warn!("orbital simulation module missing after registration"),
    }

    engine.set_game(Box::new(DemoGame::new()));

    info!(
        fps_limit = config.timing.fps_limit,
        update_rate = config.timing.update_rate,
        auto_close = config.debug.auto_close_seconds,
        started = %Engine::date_time(),
        "starting demo"
    );
    let status = engine.run();
    std::process::exit(status);
}

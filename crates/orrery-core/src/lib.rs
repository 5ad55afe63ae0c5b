//! Orrery Engine orchestration core.
//!
//! Provides the typed, stage-ordered module registry and the main loop that
//! drives it: simulation updates run in ascending stage order once per tick,
//! render submission runs once per iteration, an optional frame-rate cap
//! throttles the loop, and smoothed UPS/FPS readings are published once per
//! second. Everything runs on a single logical thread; see [`Engine`] for
//! the loop contract and [`ModuleRegistry`] for the registration contract.

mod context;
mod engine;
mod error;
mod game;
mod module;
mod rate;
mod registry;
mod time;

pub use context::EngineContext;
pub use engine::Engine;
pub use error::{EngineError, RegistryError};
pub use game::Game;
pub use module::{Module, Stage};
pub use rate::RateCounter;
pub use registry::ModuleRegistry;
pub use time::{Delta, EngineClock, IntervalTimer};

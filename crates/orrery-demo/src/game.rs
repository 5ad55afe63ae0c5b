//! The demo's application object.

use orrery_core::{EngineContext, Game};
use tracing::{info, trace};

/// Minimal game that counts its update ticks.
pub struct DemoGame {
    ticks: u64,
}

impl DemoGame {
    pub fn new() -> Self {
        Self { ticks: 0 }
    }
}

impl Default for DemoGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for DemoGame {
    fn update(&mut self, ctx: &mut EngineContext<'_>) {
        if self.ticks == 0 {
            info!(time = ctx.time(), "game started");
        }
        self.ticks += 1;
        trace!(ticks = self.ticks, delta = ctx.delta(), "game tick");
    }
}

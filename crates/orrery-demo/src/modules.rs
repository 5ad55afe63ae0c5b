//! Sample modules exercising each execution stage.

use std::any::Any;
use std::f64::consts::TAU;

use orrery_core::{EngineContext, Module};
use tracing::{info, trace};

/// Closes the engine after a fixed number of engine seconds.
///
/// Registered in the `Always` stage so it fires even when updates are
/// gated to a fixed rate.
pub struct AutoCloseWatchdog {
    deadline: f64,
}

impl AutoCloseWatchdog {
    pub fn new(seconds: f64) -> Self {
        Self { deadline: seconds }
    }
}

impl Module for AutoCloseWatchdog {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn update(&mut self, ctx: &mut EngineContext<'_>) {
        if ctx.time() >= self.deadline {
            info!(elapsed = ctx.time(), "auto-close deadline reached");
            ctx.request_close(false);
        }
    }
}

struct Body {
    name: String,
    radius_au: f64,
    period_days: f64,
    angle_rad: f64,
}

/// Circular-orbit propagation for a handful of named bodies.
///
/// One simulated day passes per engine second, so the inner planets
/// visibly move during a short demo run.
pub struct OrbitalSim {
    bodies: Vec<Body>,
}

impl OrbitalSim {
    pub fn new() -> Self {
        Self { bodies: Vec::new() }
    }

    /// Adds a body on a circular orbit at `radius_au` with the given
    /// orbital period.
    pub fn add_body(&mut self, name: &str, radius_au: f64, period_days: f64) {
        self.bodies.push(Body {
            name: name.to_string(),
            radius_au,
            period_days,
            angle_rad: 0.0,
        });
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Advances every orbit by `days` simulated days.
    pub fn advance(&mut self, days: f64) {
        for body in &mut self.bodies {
            body.angle_rad = (body.angle_rad + TAU * days / body.period_days).rem_euclid(TAU);
            trace!(
                body = %body.name,
                radius_au = body.radius_au,
                angle_deg = body.angle_rad.to_degrees(),
                "orbit advanced"
            );
        }
    }
}

impl Default for OrbitalSim {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for OrbitalSim {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn update(&mut self, ctx: &mut EngineContext<'_>) {
        // 1 engine second = 1 simulated day.
        self.advance(ctx.delta());
    }
}

/// Logs UPS/FPS once per second from the `Render` stage.
pub struct FrameStats {
    last_report: f64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self { last_report: 0.0 }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for FrameStats {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn render(&mut self, ctx: &mut EngineContext<'_>) {
        if ctx.time() - self.last_report >= 1.0 {
            info!(
                ups = ctx.ups(),
                fps = ctx.fps(),
                delta_ms = ctx.delta() * 1000.0,
                delta_render_ms = ctx.delta_render() * 1000.0,
                "frame stats"
            );
            self.last_report = ctx.time();
        }
    }
}

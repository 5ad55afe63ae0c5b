//! The engine surface handed to module and game hooks.

use crate::game::Game;

/// Timing readings captured at the top of the current phase.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FrameInfo {
    pub time: f64,
    pub delta: f64,
    pub delta_render: f64,
    pub ups: u32,
    pub fps: u32,
}

/// Commands issued from inside hooks, applied at the iteration boundary.
#[derive(Default)]
pub(crate) struct CommandQueue {
    pub pending_game: Option<Box<dyn Game>>,
    pub close: Option<bool>,
}

impl CommandQueue {
    /// Latches the first close request; later requests are no-ops.
    pub fn request_close(&mut self, error: bool) {
        if self.close.is_none() {
            self.close = Some(error);
        }
    }
}

/// What a [`Module`](crate::Module) or [`Game`](crate::Game) hook sees of
/// the engine.
///
/// Reads are snapshots taken at the top of the current phase. Mutations
/// (closing, swapping the game) are deferred to the end of the iteration,
/// so in-flight traversals always complete against a stable registry and
/// game object.
pub struct EngineContext<'a> {
    frame: FrameInfo,
    commands: &'a mut CommandQueue,
}

impl<'a> EngineContext<'a> {
    pub(crate) fn new(frame: FrameInfo, commands: &'a mut CommandQueue) -> Self {
        Self { frame, commands }
    }

    /// Offset-adjusted engine time in seconds.
    pub fn time(&self) -> f64 {
        self.frame.time
    }

    /// Seconds between the two most recent update ticks.
    pub fn delta(&self) -> f64 {
        self.frame.delta
    }

    /// Seconds between the two most recent render phases.
    pub fn delta_render(&self) -> f64 {
        self.frame.delta_render
    }

    /// Published update ticks per second.
    pub fn ups(&self) -> u32 {
        self.frame.ups
    }

    /// Published render phases per second.
    pub fn fps(&self) -> u32 {
        self.frame.fps
    }

    /// Requests engine shutdown at the end of the current iteration.
    ///
    /// `error` marks the close as error-originated, which turns the run's
    /// exit status non-zero. Idempotent: only the first request takes
    /// effect.
    pub fn request_close(&mut self, error: bool) {
        self.commands.request_close(error);
    }

    /// Replaces the active game at the end of the current iteration.
    ///
    /// The outgoing instance is dropped before the incoming instance's
    /// first update. Multiple swaps within one iteration keep the last.
    pub fn set_game(&mut self, game: Box<dyn Game>) {
        self.commands.pending_game = Some(game);
    }
}

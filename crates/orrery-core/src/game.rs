//! The hot-swappable application object.

use crate::context::EngineContext;

/// The active application driven by the engine.
///
/// Exactly one game is installed at a time. The loop invokes
/// [`update`](Game::update) once per update tick, after every update-stage
/// module has run. A game can be replaced mid-run through
/// [`EngineContext::set_game`](crate::EngineContext::set_game); the
/// replaced instance is dropped at the iteration boundary, before the
/// replacement's first update. Anything holding a reference into the old
/// game (scene containers, UI trees) must detach as part of the swap.
pub trait Game {
    /// Per-tick hook.
    fn update(&mut self, ctx: &mut EngineContext<'_>);
}

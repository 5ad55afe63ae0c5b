//! The module capability set and its execution stages.

use std::any::Any;

use crate::context::EngineContext;

/// Ordered execution buckets for registered modules.
///
/// Enumeration order is execution order. `Always` runs at the top of every
/// loop iteration, even when the update tick is gated to a fixed rate.
/// `PreUpdate`, `Update`, and `PostUpdate` run once per update tick, and
/// `Render` runs once per iteration after frame throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Always,
    PreUpdate,
    Update,
    PostUpdate,
    Render,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::Always,
        Stage::PreUpdate,
        Stage::Update,
        Stage::PostUpdate,
        Stage::Render,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Stage::Always => 0,
            Stage::PreUpdate => 1,
            Stage::Update => 2,
            Stage::PostUpdate => 3,
            Stage::Render => 4,
        }
    }
}

/// A long-lived engine subsystem.
///
/// At most one module per concrete type may be registered; the registry
/// owns the instance and drops it on removal or teardown. The loop invokes
/// the hook matching the module's stage: [`update`](Module::update) for
/// `Always` through `PostUpdate`, [`render`](Module::render) for `Render`.
/// Both hooks default to no-ops so a module implements only what its stage
/// needs.
///
/// The two `Any` accessors power typed lookup through
/// [`ModuleRegistry::get`](crate::ModuleRegistry::get); the usual
/// implementation is `self` for both.
pub trait Module: 'static {
    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable borrow as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Per-tick simulation hook.
    fn update(&mut self, _ctx: &mut EngineContext<'_>) {}

    /// Per-iteration render hook.
    fn render(&mut self, _ctx: &mut EngineContext<'_>) {}
}

//! Typed, stage-ordered registry of engine modules.

use std::any::{TypeId, type_name};
use std::collections::HashMap;

use tracing::debug;

use crate::error::RegistryError;
use crate::module::{Module, Stage};

struct Entry {
    stage: Stage,
    module: Box<dyn Module>,
}

/// Heterogeneous collection of singleton modules, keyed by concrete type
/// and indexed per [`Stage`] for ordered traversal.
///
/// The primary map and the per-stage index update together inside the same
/// `&mut self` call, and a traversal holds the exclusive borrow for its
/// whole duration. Visitors therefore cannot mutate the registry (rejected
/// at compile time) and can never observe a partially updated index.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: HashMap<TypeId, Entry>,
    stages: [Vec<TypeId>; Stage::ALL.len()],
    order: Vec<TypeId>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` under its concrete type at `stage`.
    ///
    /// Within a stage, registration order is traversal order. Fails,
    /// leaving the registry untouched, if a module of the same type is
    /// already present.
    pub fn add<M: Module>(&mut self, stage: Stage, module: M) -> Result<(), RegistryError> {
        let key = TypeId::of::<M>();
        if self.entries.contains_key(&key) {
            return Err(RegistryError::AlreadyRegistered {
                name: type_name::<M>(),
            });
        }
        self.entries.insert(
            key,
            Entry {
                stage,
                module: Box::new(module),
            },
        );
        self.stages[stage.index()].push(key);
        self.order.push(key);
        debug!(module = type_name::<M>(), ?stage, "module registered");
        Ok(())
    }

    /// Unregisters and drops the module of type `M`.
    ///
    /// Returns `false` (non-fatally) when no such module is registered.
    /// Remaining entries keep their relative order.
    pub fn remove<M: Module>(&mut self) -> bool {
        let key = TypeId::of::<M>();
        let Some(entry) = self.entries.remove(&key) else {
            return false;
        };
        self.stages[entry.stage.index()].retain(|id| *id != key);
        self.order.retain(|id| *id != key);
        debug!(module = type_name::<M>(), "module removed");
        true
    }

    /// Whether a module of type `M` is registered.
    pub fn has<M: Module>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<M>())
    }

    /// The stage `M` was registered under, if present.
    pub fn stage_of<M: Module>(&self) -> Option<Stage> {
        self.entries.get(&TypeId::of::<M>()).map(|entry| entry.stage)
    }

    /// Typed lookup. Absent types yield `None`, never a fabricated value.
    pub fn get<M: Module>(&self) -> Option<&M> {
        self.entries
            .get(&TypeId::of::<M>())
            .and_then(|entry| entry.module.as_any().downcast_ref::<M>())
    }

    /// Mutable typed lookup.
    pub fn get_mut<M: Module>(&mut self) -> Option<&mut M> {
        self.entries
            .get_mut(&TypeId::of::<M>())
            .and_then(|entry| entry.module.as_any_mut().downcast_mut::<M>())
    }

    /// Visits every registered module exactly once, in ascending stage
    /// order and registration order within each stage.
    pub fn for_each(&mut self, mut visit: impl FnMut(&mut dyn Module)) {
        for stage in Stage::ALL {
            self.visit_stage(stage, &mut visit);
        }
    }

    /// Visits the modules of one stage in registration order.
    pub fn for_each_in_stage(&mut self, stage: Stage, mut visit: impl FnMut(&mut dyn Module)) {
        self.visit_stage(stage, &mut visit);
    }

    fn visit_stage(&mut self, stage: Stage, visit: &mut impl FnMut(&mut dyn Module)) {
        for key in &self.stages[stage.index()] {
            let entry = self
                .entries
                .get_mut(key)
                .expect("stage index out of sync with module map");
            visit(entry.module.as_mut());
        }
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every module in reverse registration order.
    ///
    /// Later modules may hold handles into earlier ones, so teardown
    /// unwinds registration.
    pub fn clear(&mut self) {
        while let Some(key) = self.order.pop() {
            if let Some(entry) = self.entries.remove(&key) {
                self.stages[entry.stage.index()].retain(|id| *id != key);
            }
        }
    }
}

impl Drop for ModuleRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}

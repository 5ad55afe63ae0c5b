//! Engine and registry error types.

/// Errors from module registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A module of the same concrete type is already registered.
    #[error("module `{name}` is already registered")]
    AlreadyRegistered {
        /// Type name of the rejected module.
        name: &'static str,
    },
}

/// Errors from engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Another engine instance is alive in this process. Two engines would
    /// race on process-wide time and shutdown state, so the second
    /// construction fails instead of coexisting.
    #[error("an engine instance is already active in this process")]
    AlreadyActive,
}

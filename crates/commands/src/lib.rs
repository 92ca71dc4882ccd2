//! Command implementations for the Glia Functions CLI
//!
//! Every command takes its collaborators through [`context::CommandDependencies`]
//! so the same code runs against the real API or against mocks.

/// Command implementations module
pub mod commands;

/// Shared per-invocation state
pub mod context;

#[cfg(test)]
pub mod test_helpers;

pub use commands::{
    configure, create, debug_auth, deploy, info, invoke, kv, list, logs, metadata, selection,
    show_config, stats, update,
};
pub use context::{CommandDependencies, GlobalArgs};

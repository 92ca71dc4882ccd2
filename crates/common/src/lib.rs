//! Common utilities shared by the Glia Functions CLI crates
//!
//! Currently this is the terminal user interface: the production
//! implementation built on indicatif, console and dialoguer, and a scripted
//! implementation for tests.

/// User interface implementations
pub mod ui;

pub use ui::{RealUserInterface, TestUserInterface};

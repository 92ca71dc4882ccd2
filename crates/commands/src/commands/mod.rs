//! One module per CLI operation

pub mod configure;
pub mod create;
pub mod debug_auth;
pub mod deploy;
pub mod info;
pub mod invoke;
pub mod kv;
pub mod list;
pub mod logs;
pub mod metadata;
pub mod selection;
pub mod show_config;
pub mod stats;
pub mod update;

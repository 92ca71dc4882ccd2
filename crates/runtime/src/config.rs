//! Centralized configuration for the Glia Functions CLI
//!
//! This module provides a single source of truth for all configuration values
//! used throughout the application.
//!
//! # Environment Variables
//!
//! The following environment variables are consulted after the config file:
//! - `api_key_id`: API key identifier
//! - `api_key_secret`: API key secret
//! - `site_id`: Default site
//! - `GLIA_ENV`: Environment name (`production`, `beta`, `production-eu`, `beta-eu`)
//! - `GLIA_CONFIG_PATH`: Override the location of the config file

/// Media type sent in the `Accept` header of every management API call
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.salemove.v1+json";

/// Compatibility date attached to every new function version
pub const COMPATIBILITY_DATE: &str = "2023-11-21";

/// Seconds between deployment task polls
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default API timeout in seconds
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Page size used when listing function versions
pub const DEFAULT_VERSIONS_PER_PAGE: u32 = 20;

/// Page size used when listing key-value pairs
pub const DEFAULT_KV_PAGE_SIZE: u32 = 100;

/// Longest recent-logs window accepted, in hours (ten years)
pub const MAX_RECENT_LOG_HOURS: u32 = 24 * 366 * 10;

/// Directory under the home directory holding the config file
pub const CONFIG_DIR_NAME: &str = ".glia";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable name for overriding the config file location
pub const CONFIG_PATH_ENV_VAR: &str = "GLIA_CONFIG_PATH";

/// Environment variable holding the API key id
pub const API_KEY_ID_ENV_VAR: &str = "api_key_id";

/// Environment variable holding the API key secret
pub const API_KEY_SECRET_ENV_VAR: &str = "api_key_secret";

/// Environment variable holding the default site id
pub const SITE_ID_ENV_VAR: &str = "site_id";

/// Environment variable holding the environment name
pub const ENVIRONMENT_ENV_VAR: &str = "GLIA_ENV";

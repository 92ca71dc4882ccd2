//! Deployment environments and their API base URLs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GliaError;

/// A Glia deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    /// US production
    #[default]
    Production,
    /// US beta
    Beta,
    /// EU production
    ProductionEu,
    /// EU beta
    BetaEu,
}

impl Environment {
    /// Every known environment, in display order
    pub const ALL: [Self; 4] = [
        Self::Production,
        Self::Beta,
        Self::ProductionEu,
        Self::BetaEu,
    ];

    /// Canonical name as written in config files and on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Beta => "beta",
            Self::ProductionEu => "production-eu",
            Self::BetaEu => "beta-eu",
        }
    }

    /// Root URL of the management API
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Production => "https://api.glia.com",
            Self::Beta => "https://api.beta.glia.com",
            Self::ProductionEu => "https://api.glia.eu",
            Self::BetaEu => "https://api.beta.glia.eu",
        }
    }

    /// Short label used in interactive menus
    pub const fn label(self) -> &'static str {
        match self {
            Self::Production => "Production (US)",
            Self::Beta => "Beta (US)",
            Self::ProductionEu => "Production (EU)",
            Self::BetaEu => "Beta (EU)",
        }
    }

    /// Strict lookup by name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|env| env.name() == name)
    }

    /// Lenient lookup: missing or unknown names fall back to production.
    pub fn resolve(name: Option<&str>) -> Self {
        match name {
            Some(raw) => Self::parse(raw.trim()).unwrap_or_else(|| {
                tracing::debug!("Unknown environment '{}', using production", raw);
                Self::Production
            }),
            None => Self::Production,
        }
    }

    /// Comma separated list of valid names, for error messages
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|env| env.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Base URL for an environment name, falling back to production.
pub fn resolve_base_url(name: Option<&str>) -> &'static str {
    Environment::resolve(name).base_url()
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = GliaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            GliaError::validation(format!(
                "Invalid environment '{s}'. Must be one of: {}",
                Self::valid_names()
            ))
        })
    }
}

//! Persisted configuration, the function context and credential resolution
//!
//! The config file is a JSON object at `~/.glia/config.json`. Fields this
//! crate does not know about are carried through every rewrite. Writers take
//! an exclusive lock on a sibling `.lock` file, re-read the file under the
//! lock and replace it atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{
    API_KEY_ID_ENV_VAR, API_KEY_SECRET_ENV_VAR, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    CONFIG_PATH_ENV_VAR, ENVIRONMENT_ENV_VAR, SITE_ID_ENV_VAR,
};
use crate::deps::EnvVars;
use crate::environment::Environment;
use crate::error::{GliaError, Result};
use crate::types::{Credentials, FunctionSummary, mask_key_id};

/// Contents of the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    /// API key identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
    /// API key secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_secret: Option<String>,
    /// Default site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    /// Environment name, kept as written so unknown names survive a rewrite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Selected function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_function: Option<FunctionContext>,
    /// Keys written by other tools
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The function subsequent commands operate on when none is given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionContext {
    /// Function id
    pub id: String,
    /// Function name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version deployed at selection time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version_id: Option<String>,
    /// Owning site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    /// When the selection was made
    #[serde(with = "selected_at_format")]
    pub selected_at: DateTime<Utc>,
}

impl FunctionContext {
    /// Context for a function selected at the given time
    pub fn from_summary(function: &FunctionSummary, selected_at: DateTime<Utc>) -> Self {
        Self {
            id: function.id.clone(),
            name: function.name.clone(),
            description: function.description.clone(),
            current_version_id: function.current_version_id.clone(),
            site_id: function.site_id.clone(),
            selected_at,
        }
    }
}

// Older config files store `selected_at` as epoch seconds.
mod selected_at_format {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Epoch(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Epoch(secs) => {
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1_000_000_000.0) as u32;
                DateTime::from_timestamp(whole as i64, nanos)
                    .ok_or_else(|| D::Error::custom("selected_at out of range"))
            }
            Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(D::Error::custom),
        }
    }
}

/// Explicit per-invocation settings, highest precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Environment chosen on the command line or by a tool argument
    pub environment: Option<Environment>,
    /// Site chosen on the command line or by a tool argument
    pub site_id: Option<String>,
}

/// Settings after layering overrides, the config file and the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// Credentials, present only when both key parts were found
    pub credentials: Option<Credentials>,
    /// Effective environment
    pub environment: Environment,
    /// Effective site
    pub site_id: Option<String>,
}

impl ResolvedSettings {
    /// Credentials or a configuration error telling the user what to do
    pub fn require_credentials(&self) -> Result<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            GliaError::configuration(
                "API credentials not found. Run 'glia configure' or set the api_key_id and api_key_secret environment variables",
            )
        })
    }

    /// Site or a configuration error
    pub fn require_site_id(&self) -> Result<&str> {
        self.site_id.as_deref().ok_or_else(|| {
            GliaError::configuration("Site ID is required (--site-id or configure a default)")
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Layer overrides, the stored config and environment variables.
///
/// Per field the first non-empty value wins, in that order. An unknown
/// environment name resolves to production.
pub fn resolve_settings(
    stored: &StoredConfig,
    overrides: &Overrides,
    env: &dyn EnvVars,
) -> ResolvedSettings {
    let environment = overrides.environment.unwrap_or_else(|| {
        let name = non_empty(stored.environment.as_ref()).or_else(|| env.var(ENVIRONMENT_ENV_VAR));
        Environment::resolve(name.as_deref())
    });

    let site_id = non_empty(overrides.site_id.as_ref())
        .or_else(|| non_empty(stored.site_id.as_ref()))
        .or_else(|| env.var(SITE_ID_ENV_VAR));

    let key_id = non_empty(stored.api_key_id.as_ref()).or_else(|| env.var(API_KEY_ID_ENV_VAR));
    let secret =
        non_empty(stored.api_key_secret.as_ref()).or_else(|| env.var(API_KEY_SECRET_ENV_VAR));

    let credentials = match (key_id, secret) {
        (Some(api_key_id), Some(api_key_secret)) => Some(Credentials {
            api_key_id,
            api_key_secret,
            site_ids: site_id.iter().cloned().collect(),
        }),
        _ => None,
    };

    ResolvedSettings {
        credentials,
        environment,
        site_id,
    }
}

/// Display form of the stored configuration with secrets masked
pub fn redacted_view(stored: &StoredConfig) -> Vec<(&'static str, String)> {
    let not_set = || "Not set".to_string();
    vec![
        (
            "API Key ID",
            stored
                .api_key_id
                .as_deref()
                .map_or_else(not_set, mask_key_id),
        ),
        (
            "API Key Secret",
            stored
                .api_key_secret
                .as_ref()
                .map_or_else(not_set, |_| "*****".to_string()),
        ),
        (
            "Site ID",
            stored.site_id.clone().unwrap_or_else(not_set),
        ),
        (
            "Environment",
            stored
                .environment
                .clone()
                .unwrap_or_else(|| Environment::Production.name().to_string()),
        ),
    ]
}

/// Reads and writes the config file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store backed by an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `GLIA_CONFIG_PATH` or `~/.glia/config.json`
    pub fn from_env(env: &dyn EnvVars) -> Result<Self> {
        if let Some(path) = env.var(CONFIG_PATH_ENV_VAR) {
            return Ok(Self::new(path));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| GliaError::configuration("Could not determine home directory"))?;
        Ok(Self::new(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)))
    }

    /// Location of the config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map_or_else(
            || CONFIG_FILE_NAME.into(),
            std::ffi::OsStr::to_os_string,
        );
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Load the config; a missing file is an empty config.
    pub fn load(&self) -> Result<StoredConfig> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredConfig::default());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(StoredConfig::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            GliaError::configuration(format!(
                "Failed to parse {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Apply a mutation under the file lock and persist the result.
    pub fn update<T>(&self, mutate: impl FnOnce(&mut StoredConfig) -> T) -> Result<T> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let lock_file = fs::File::create(self.lock_path())?;
        lock_file.lock_exclusive()?;

        let result = self.load().and_then(|mut config| {
            let value = mutate(&mut config);
            self.write_atomic(parent, &config)?;
            Ok(value)
        });

        let _ = FileExt::unlock(&lock_file);
        result
    }

    fn write_atomic(&self, dir: &Path, config: &StoredConfig) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, config)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(&self.path).map_err(|e| GliaError::Io(e.error))?;
        tracing::debug!("Wrote config to {}", self.path.display());
        Ok(())
    }

    /// Persist credentials, site and environment chosen during `configure`
    pub fn save_settings(
        &self,
        credentials: &Credentials,
        site_id: Option<&str>,
        environment: Environment,
    ) -> Result<()> {
        self.update(|config| {
            config.api_key_id = Some(credentials.api_key_id.clone());
            config.api_key_secret = Some(credentials.api_key_secret.clone());
            config.site_id = site_id.map(str::to_string);
            config.environment = Some(environment.name().to_string());
        })
    }

    /// Remember a function as the current one
    pub fn set_current_function(
        &self,
        function: &FunctionSummary,
        selected_at: DateTime<Utc>,
    ) -> Result<FunctionContext> {
        let context = FunctionContext::from_summary(function, selected_at);
        let stored = context.clone();
        self.update(move |config| config.current_function = Some(stored))?;
        tracing::info!("Selected function {} ({})", context.name, context.id);
        Ok(context)
    }

    /// The current function, if one is selected
    pub fn current_function(&self) -> Result<Option<FunctionContext>> {
        Ok(self.load()?.current_function)
    }

    /// Forget the current function; returns whether one was selected
    pub fn clear_current_function(&self) -> Result<bool> {
        self.update(|config| config.current_function.take().is_some())
    }
}

/// Pick the function to operate on: the explicit id, else the current one.
pub fn resolve_function_id(
    explicit: Option<&str>,
    current: Option<&FunctionContext>,
) -> Result<String> {
    explicit
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .or_else(|| current.map(|c| c.id.clone()))
        .ok_or_else(|| {
            GliaError::configuration(
                "Function ID is required. Pass --function-id or select a function with 'glia select'",
            )
        })
}

/// Label for a function in progress messages
pub fn function_label(
    function_id: &str,
    explicit: Option<&str>,
    current: Option<&FunctionContext>,
) -> String {
    match current {
        Some(context) if explicit.is_none() && context.id == function_id => context.name.clone(),
        _ => {
            let prefix: String = function_id.chars().take(8).collect();
            format!("{prefix}...")
        }
    }
}

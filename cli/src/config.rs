use std::fmt;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use taskboard_backend_client::RefreshStrategy;
use taskboard_login::find_taskboard_home;
use taskboard_tasks_client::WireFormat;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const BASE_URL_ENV_VAR: &str = "TASKBOARD_BASE_URL";
pub const BACKEND_ENV_VAR: &str = "TASKBOARD_BACKEND";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Http,
    /// In-memory tasks; nothing is sent over the network.
    Mock,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Http => "http",
            BackendKind::Mock => "mock",
        })
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    pub base_url: Option<String>,
    pub wire_format: Option<WireFormat>,
    pub refresh_strategy: Option<RefreshStrategy>,
    pub user_agent: Option<String>,
    pub backend: Option<BackendKind>,
}

/// Values that take precedence over `config.toml`.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub backend: Option<BackendKind>,
}

impl ConfigOverrides {
    /// `TASKBOARD_BASE_URL` and `TASKBOARD_BACKEND`, with `flag_base_url`
    /// taking precedence over the former.
    pub fn from_env(flag_base_url: Option<String>) -> io::Result<Self> {
        let base_url = flag_base_url.or_else(|| non_empty_env(BASE_URL_ENV_VAR));
        let backend = match non_empty_env(BACKEND_ENV_VAR) {
            Some(raw) => Some(parse_backend(&raw).map_err(|msg| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("{BACKEND_ENV_VAR}: {msg}"))
            })?),
            None => None,
        };
        Ok(Self { base_url, backend })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_backend(raw: &str) -> Result<BackendKind, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "http" => Ok(BackendKind::Http),
        "mock" => Ok(BackendKind::Mock),
        other => Err(format!("unknown backend `{other}` (expected http or mock)")),
    }
}

/// Effective configuration after defaults, file and overrides are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub taskboard_home: PathBuf,
    pub base_url: String,
    pub wire_format: WireFormat,
    pub refresh_strategy: RefreshStrategy,
    pub user_agent: Option<String>,
    pub backend: BackendKind,
}

impl Config {
    pub fn load(overrides: ConfigOverrides) -> io::Result<Self> {
        let home = find_taskboard_home()?;
        Self::load_from_home(home, overrides)
    }

    pub fn load_from_home(taskboard_home: PathBuf, overrides: ConfigOverrides) -> io::Result<Self> {
        let file = read_config_toml(&taskboard_home.join(CONFIG_FILE_NAME))?.unwrap_or_default();
        Ok(Self::from_parts(taskboard_home, file, overrides))
    }

    fn from_parts(taskboard_home: PathBuf, file: ConfigToml, overrides: ConfigOverrides) -> Self {
        Self {
            taskboard_home,
            base_url: overrides
                .base_url
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            wire_format: file.wire_format.unwrap_or_default(),
            refresh_strategy: file.refresh_strategy.unwrap_or_default(),
            user_agent: file.user_agent,
            backend: overrides.backend.or(file.backend).unwrap_or_default(),
        }
    }

    /// Key/value pairs for display.
    pub fn summary_entries(&self) -> Vec<(&'static str, String)> {
        let refresh_strategy = match self.refresh_strategy {
            RefreshStrategy::Coalesced => "coalesced",
            RefreshStrategy::Independent => "independent",
        };
        vec![
            ("home", self.taskboard_home.display().to_string()),
            ("backend", self.backend.to_string()),
            ("base_url", self.base_url.clone()),
            ("wire_format", self.wire_format.to_string()),
            ("refresh_strategy", refresh_strategy.to_string()),
            (
                "user_agent",
                self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ]
    }
}

fn read_config_toml(path: &Path) -> io::Result<Option<ConfigToml>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<ConfigToml>(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::error!("Failed to parse {}: {err}", path.display());
                Err(io::Error::new(io::ErrorKind::InvalidData, err))
            }
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{} not found, using defaults", path.display());
            Ok(None)
        }
        Err(err) => {
            tracing::error!("Failed to read {}: {err}", path.display());
            Err(err)
        }
    }
}

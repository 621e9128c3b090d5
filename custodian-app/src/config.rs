use anyhow::{Context, Result};
use custodian_core::GovernorConfig;
use custodian_executor::{SimulatedExecutor, Tool};
use custodian_memory::MemoryConfig;
use custodian_policy::SettingsSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "CUSTODIAN_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "custodian.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    Http {
        endpoint: String,
        /// Name of the environment variable holding the bearer token.
        #[serde(default)]
        api_key_env: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Scripted {
        #[serde(default)]
        script: Option<PathBuf>,
    },
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Scripted { script: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutorConfig {
    #[serde(default = "SimulatedExecutor::default_allowlist")]
    pub allowlist: Vec<Tool>,
    #[serde(default)]
    pub latency_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            allowlist: SimulatedExecutor::default_allowlist(),
            latency_ms: 0,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_idle_check_secs() -> u64 {
    25
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub governor: GovernorConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub settings: SettingsSnapshot,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
    /// Extra phrases screened out of suggestions, on top of the built-in list.
    #[serde(default)]
    pub blocked_phrases: Vec<String>,
    /// Zero disables idle checks.
    #[serde(default = "default_idle_check_secs")]
    pub idle_check_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            governor: GovernorConfig::default(),
            memory: MemoryConfig::default(),
            settings: SettingsSnapshot::default(),
            provider: ProviderConfig::default(),
            executor: ExecutorConfig::default(),
            data_dir: default_data_dir(),
            audit_log: None,
            blocked_phrases: Vec::new(),
            idle_check_secs: default_idle_check_secs(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Reads `$CUSTODIAN_CONFIG`, falling back to `custodian.yaml`. A missing
    /// default file yields the built-in defaults.
    pub fn load_default() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(path),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load(path)
                } else {
                    tracing::info!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }
}

use anyhow::{Context, Result};
use custodian_core::{GovernanceRuntime, Governor, JsonlAuditSink, RuntimeHandle};
use custodian_executor::{ActionExecutor, SimulatedExecutor};
use custodian_memory::{FileStore, MemoryManager};
use custodian_policy::PolicyValidator;
use custodian_providers::{HttpSuggestionProvider, ScriptedProvider, SuggestionProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::{AppConfig, ProviderConfig};

pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn SuggestionProvider>> {
    match config {
        ProviderConfig::Http {
            endpoint,
            api_key_env,
            timeout_secs,
        } => {
            let api_key = api_key_env
                .as_deref()
                .and_then(|name| std::env::var(name).ok());
            if api_key_env.is_some() && api_key.is_none() {
                tracing::warn!("API key variable is set in config but not in the environment");
            }
            Ok(Arc::new(HttpSuggestionProvider::with_timeout(
                endpoint.clone(),
                api_key,
                Duration::from_secs(*timeout_secs),
            )))
        }
        ProviderConfig::Scripted { script: Some(path) } => {
            let provider = ScriptedProvider::from_yaml_file(path)
                .with_context(|| format!("Failed to load script {}", path.display()))?;
            Ok(Arc::new(provider))
        }
        ProviderConfig::Scripted { script: None } => Ok(Arc::new(ScriptedProvider::new())),
    }
}

pub fn build_governor(config: &AppConfig) -> Result<Governor> {
    let store = FileStore::new(config.data_dir.join("memory"))
        .context("Failed to open durable memory store")?;
    let memory = MemoryManager::open(config.memory.clone(), Arc::new(store));

    let validator = config
        .blocked_phrases
        .iter()
        .fold(PolicyValidator::new(), |validator, phrase| {
            validator.with_blocked_phrase(phrase.as_str())
        });

    let mut governor = Governor::new(config.governor.clone(), config.settings.clone(), memory)
        .with_validator(validator);
    if let Some(path) = &config.audit_log {
        let sink = JsonlAuditSink::new(path)
            .with_context(|| format!("Failed to open audit log {}", path.display()))?;
        governor = governor.with_audit_sink(Box::new(sink));
    }
    Ok(governor)
}

/// Wires memory, provider and executor into a running governance runtime.
pub fn start(config: &AppConfig) -> Result<(RuntimeHandle, JoinHandle<()>)> {
    let governor = build_governor(config)?;
    let provider = build_provider(&config.provider)?;
    let executor: Arc<dyn ActionExecutor> = Arc::new(
        SimulatedExecutor::new(config.executor.allowlist.clone())
            .with_latency(Duration::from_millis(config.executor.latency_ms)),
    );
    let idle = (config.idle_check_secs > 0).then(|| Duration::from_secs(config.idle_check_secs));

    tracing::info!(
        "Starting with profile {:?}, language {}",
        config.settings.profile,
        config.settings.language
    );
    Ok(GovernanceRuntime::spawn(governor, provider, executor, idle))
}

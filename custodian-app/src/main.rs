use anyhow::{Context, Result};
use custodian_app::bootstrap;
use custodian_app::config::AppConfig;
use custodian_app::repl::Repl;
use custodian_interfaces::{Interface, TerminalInterface};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load_default()?;
    let (handle, runtime) =
        bootstrap::start(&config).context("Failed to start governance runtime")?;

    let interface: Arc<dyn Interface> = Arc::new(TerminalInterface::new());
    Repl::new(handle, interface, config.settings.clone()).run().await?;

    runtime.await.context("Governance runtime panicked")?;
    Ok(())
}

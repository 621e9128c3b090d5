//! Line-oriented front end: slash commands drive the runtime's control
//! surface, anything else is submitted as user input.

use anyhow::Result;
use custodian_core::RuntimeHandle;
use custodian_interfaces::{status_label, Interface};
use custodian_policy::{AssistMode, Language, Profile, SettingsSnapshot};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    Status,
    Audit,
    Purge,
    Remember(String),
    Profile(Profile),
    Mode(AssistMode),
    Language(Language),
    Online(bool),
    Quit,
    Say(String),
    Invalid(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Some(ReplCommand::Say(line.to_string()));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        let arg = rest.split_whitespace().next().unwrap_or_default();

        let parsed = match name {
            "help" => ReplCommand::Help,
            "status" => ReplCommand::Status,
            "audit" => ReplCommand::Audit,
            "purge" => ReplCommand::Purge,
            "remember" if !rest.is_empty() => ReplCommand::Remember(rest.to_string()),
            "online" => ReplCommand::Online(true),
            "offline" => ReplCommand::Online(false),
            "quit" | "exit" => ReplCommand::Quit,
            "profile" => match arg.parse::<Profile>() {
                Ok(profile) => ReplCommand::Profile(profile),
                Err(_) => ReplCommand::Invalid(format!("unknown profile '{}'", arg)),
            },
            "mode" => match arg.to_lowercase().as_str() {
                "passive" => ReplCommand::Mode(AssistMode::Passive),
                "active" => ReplCommand::Mode(AssistMode::Active),
                _ => ReplCommand::Invalid(format!("unknown mode '{}'", arg)),
            },
            "lang" | "language" if !arg.is_empty() => ReplCommand::Language(Language::from_tag(arg)),
            _ => ReplCommand::Invalid(format!("unknown command '/{}'", name)),
        };
        Some(parsed)
    }
}

const HELP: &str = "Commands:
  /status              show the current status
  /audit               print the audit trail
  /remember <text>     keep a fact in long-term memory
  /purge               erase all remembered context
  /profile <p>         normal | active | critical
  /mode <m>            passive | active
  /lang <tag>          e.g. en-US, pt-BR
  /online, /offline    toggle connectivity
  /quit                exit
Anything else is sent to the assistant. Say 'stop' at any time to suspend it.";

pub struct Repl {
    handle: RuntimeHandle,
    interface: Arc<dyn Interface>,
    settings: SettingsSnapshot,
}

impl Repl {
    pub fn new(handle: RuntimeHandle, interface: Arc<dyn Interface>, settings: SettingsSnapshot) -> Self {
        Self {
            handle,
            interface,
            settings,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut notices = self.handle.subscribe_notices();
        let printer_interface = Arc::clone(&self.interface);
        let printer = tokio::spawn(async move {
            loop {
                match notices.recv().await {
                    Ok(notice) => printer_interface.show_notice(&notice).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Skipped {} notices", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        self.interface.send_output("custodian ready. /help for commands.").await;

        while let Some(line) = self.interface.receive_input().await {
            let Some(command) = ReplCommand::parse(&line) else {
                continue;
            };
            if command == ReplCommand::Quit {
                break;
            }
            self.execute(command).await?;
        }

        printer.abort();
        // The runtime may already be gone; nothing left to do then.
        let _ = self.handle.shutdown().await;
        Ok(())
    }

    async fn execute(&mut self, command: ReplCommand) -> Result<()> {
        match command {
            ReplCommand::Help => self.interface.send_output(HELP).await,
            ReplCommand::Status => self.interface.show_status(self.handle.status()).await,
            ReplCommand::Audit => {
                let events = self.handle.audit_snapshot().await?;
                for event in events {
                    let line = format!(
                        "{} {:?} [{}] {}",
                        event.timestamp.format("%H:%M:%S"),
                        event.category,
                        status_label(event.status),
                        event.message
                    );
                    self.interface.send_output(&line).await;
                }
            }
            ReplCommand::Purge => {
                if let Err(e) = self.handle.purge_memory().await {
                    self.interface
                        .send_output(&format!("Purge incomplete: {}", e))
                        .await;
                }
            }
            ReplCommand::Remember(text) => {
                if let Err(e) = self.handle.remember(text).await {
                    self.interface
                        .send_output(&format!("Could not remember that: {}", e))
                        .await;
                }
            }
            ReplCommand::Profile(profile) => {
                self.settings.profile = profile;
                self.push_settings().await?;
            }
            ReplCommand::Mode(mode) => {
                self.settings.mode = mode;
                self.push_settings().await?;
            }
            ReplCommand::Language(language) => {
                self.settings.language = language;
                self.push_settings().await?;
            }
            ReplCommand::Online(online) => self.handle.set_online(online).await?,
            ReplCommand::Say(text) => self.handle.submit_text(text).await?,
            ReplCommand::Invalid(reason) => self.interface.send_output(&reason).await,
            ReplCommand::Quit => {}
        }
        Ok(())
    }

    async fn push_settings(&self) -> Result<()> {
        self.handle.update_policy(self.settings.clone()).await?;
        Ok(())
    }
}

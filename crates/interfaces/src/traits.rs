use async_trait::async_trait;
use custodian_core::{Notice, OperationalStatus};

use crate::render::{describe_notice, status_label};

/// A user-facing surface. It only reads text in and writes text out; every
/// decision about that text is made by the governance runtime.
#[async_trait]
pub trait Interface: Send + Sync {
    async fn receive_input(&self) -> Option<String>;
    async fn send_output(&self, message: &str);

    async fn show_status(&self, status: OperationalStatus) {
        self.send_output(&format!("[{}]", status_label(status))).await;
    }

    async fn show_notice(&self, notice: &Notice) {
        self.send_output(&describe_notice(notice)).await;
    }
}

use crate::traits::Interface;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Feeds canned input lines and captures output. Used by tests and demos.
#[derive(Default)]
pub struct ScriptedInterface {
    input: Mutex<VecDeque<String>>,
    output: Mutex<Vec<String>>,
}

impl ScriptedInterface {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: Mutex::new(lines.into_iter().map(Into::into).collect()),
            output: Mutex::new(Vec::new()),
        }
    }

    pub async fn output(&self) -> Vec<String> {
        self.output.lock().await.clone()
    }
}

#[async_trait]
impl Interface for ScriptedInterface {
    async fn receive_input(&self) -> Option<String> {
        self.input.lock().await.pop_front()
    }

    async fn send_output(&self, message: &str) {
        self.output.lock().await.push(message.to_string());
    }
}

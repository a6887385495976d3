//! Message trigger: out-of-band control commands from the page.

use graines_core::Error;
use serde::Serialize;
use serde_json::Value;

use super::Coordinator;

/// Message the page posts to force a waiting version to activate.
pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// Recognized control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    SkipWaiting,
}

impl ControlCommand {
    /// Only the exact string payload `"SKIP_WAITING"` is a command.
    pub fn parse(data: &Value) -> Option<Self> {
        match data {
            Value::String(s) if s == SKIP_WAITING => Some(Self::SkipWaiting),
            _ => None,
        }
    }
}

/// What a message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "command", rename_all = "snake_case")]
pub enum MessageOutcome {
    Applied(ControlCommand),
    Ignored,
}

impl Coordinator {
    /// Apply a control message. Unrecognized payloads are ignored.
    pub async fn on_message(&self, data: &Value) -> Result<MessageOutcome, Error> {
        let Some(command) = ControlCommand::parse(data) else {
            tracing::debug!(%data, "ignoring unrecognized message");
            return Ok(MessageOutcome::Ignored);
        };

        match command {
            ControlCommand::SkipWaiting => {
                tracing::info!(generation = %self.settings.generation, "skip waiting requested by page");
                self.control.skip_waiting().await?;
            }
        }

        Ok(MessageOutcome::Applied(command))
    }
}

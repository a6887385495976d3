//! Stdio host bridge.
//!
//! Stands in for the browser runtime: it tracks the lifecycle of the one
//! deployed version, offers [`ClientControl`] to the coordinator, and turns
//! trigger lines into reply lines. Like the runtime, it activates a freshly
//! installed version on its own once skip-waiting has been requested.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use graines_core::{ClientControl, Error};
use serde::Serialize;

use crate::coordinator::Coordinator;
use crate::error::HostError;
use crate::handler::{Trigger, TriggerKind, TriggerResult, dispatch};

/// Where the deployed version is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionState {
    /// Not installed yet, or the last install failed.
    Pending,
    /// Installed and waiting for old clients to go away.
    Waiting,
    /// Activated; controls the clients.
    Active,
}

/// Lifecycle bookkeeping for the deployed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifecycleState {
    pub version: VersionState,
    pub skip_waiting: bool,
    pub clients_claimed: bool,
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self { version: VersionState::Pending, skip_waiting: false, clients_claimed: false }
    }
}

/// Shared lifecycle state; the coordinator's client control.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: Mutex<LifecycleState>,
}

impl Lifecycle {
    pub fn snapshot(&self) -> LifecycleState {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, kind: TriggerKind) {
        let mut state = self.lock();
        match kind {
            TriggerKind::Install if state.version == VersionState::Pending => state.version = VersionState::Waiting,
            TriggerKind::Activate => state.version = VersionState::Active,
            _ => {}
        }
    }

    /// Installed, asked to skip waiting, not yet active.
    fn activation_due(&self) -> bool {
        let state = self.lock();
        state.version == VersionState::Waiting && state.skip_waiting
    }
}

#[async_trait]
impl ClientControl for Lifecycle {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.lock().skip_waiting = true;
        tracing::debug!("skip waiting recorded");
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.lock().clients_claimed = true;
        tracing::debug!("clients claimed");
        Ok(())
    }
}

/// Error payload of a failed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// One reply line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TriggerResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Reply {
    fn from_result(result: Result<TriggerResult, HostError>) -> Self {
        match result {
            Ok(result) => Self { ok: true, result: Some(result), error: None },
            Err(e) => Self {
                ok: false,
                result: None,
                error: Some(ErrorBody { code: e.code().to_string(), message: e.to_string() }),
            },
        }
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| encode_failure(&e.to_string()))
    }
}

/// Reply line used when a reply itself cannot be encoded.
fn encode_failure(message: &str) -> String {
    serde_json::json!({
        "ok": false,
        "error": { "code": "ENCODE_FAILED", "message": message },
    })
    .to_string()
}

/// Bridge between trigger lines and the coordinator.
pub struct Host {
    coordinator: Coordinator,
    lifecycle: Arc<Lifecycle>,
}

impl Host {
    /// `lifecycle` must be the client control the coordinator was built with.
    pub fn new(coordinator: Coordinator, lifecycle: Arc<Lifecycle>) -> Self {
        Self { coordinator, lifecycle }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle.snapshot()
    }

    /// Handle one trigger; an automatic activation adds a second reply.
    pub async fn handle(&self, trigger: Trigger) -> Vec<Reply> {
        let mut replies = vec![self.run(trigger).await];

        if self.lifecycle.activation_due() {
            tracing::info!(generation = %self.coordinator.generation(), "activating without waiting for clients");
            replies.push(self.run(Trigger::Activate).await);
        }

        replies
    }

    /// Parse and handle one input line.
    pub async fn handle_line(&self, line: &str) -> Vec<Reply> {
        match serde_json::from_str::<Trigger>(line) {
            Ok(trigger) => self.handle(trigger).await,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting malformed trigger");
                vec![Reply::from_result(Err(e.into()))]
            }
        }
    }

    async fn run(&self, trigger: Trigger) -> Reply {
        let kind = trigger.kind();
        let result = dispatch(&self.coordinator, trigger).await;
        match &result {
            Ok(_) => self.lifecycle.record(kind),
            Err(e) => tracing::warn!(?kind, error = %e, "trigger failed"),
        }
        Reply::from_result(result)
    }
}

//! Trigger dispatch table.
//!
//! Maps each trigger kind the host runtime emits to its coordinator handler
//! and shapes the handler's result for the bridge.

use std::collections::BTreeMap;

use graines_core::{InterceptedRequest, RequestDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coordinator::{ActivateReport, Coordinator, FetchOutcome, InstallReport, MessageOutcome, ResponseSource};
use crate::error::HostError;

/// A trigger delivered by the host runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum Trigger {
    Install,
    Activate,
    Fetch { request: RequestDescriptor },
    Message {
        #[serde(default)]
        data: Value,
    },
}

/// Trigger kinds, for logging and bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Install,
    Activate,
    Fetch,
    Message,
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Install => TriggerKind::Install,
            Trigger::Activate => TriggerKind::Activate,
            Trigger::Fetch { .. } => TriggerKind::Fetch,
            Trigger::Message { .. } => TriggerKind::Message,
        }
    }
}

/// Bridge view of a fetch outcome. Bodies are rendered as lossy UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchView {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<FetchOutcome> for FetchView {
    fn from(outcome: FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Served { response, source } => Self {
                outcome: "served",
                source: Some(source),
                status: Some(response.status),
                headers: Some(response.headers),
                body: Some(String::from_utf8_lossy(&response.body).into_owned()),
            },
            FetchOutcome::Empty => {
                Self { outcome: "empty", source: None, status: None, headers: None, body: None }
            }
        }
    }
}

/// Result of a handled trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum TriggerResult {
    Install(InstallReport),
    Activate(ActivateReport),
    Fetch(FetchView),
    Message(MessageOutcome),
}

/// Route a trigger to its handler.
pub async fn dispatch(coordinator: &Coordinator, trigger: Trigger) -> Result<TriggerResult, HostError> {
    tracing::debug!(kind = ?trigger.kind(), "dispatching trigger");

    let result = match trigger {
        Trigger::Install => TriggerResult::Install(coordinator.install().await?),
        Trigger::Activate => TriggerResult::Activate(coordinator.activate().await?),
        Trigger::Fetch { request } => {
            let request = InterceptedRequest::from_descriptor(request)?;
            TriggerResult::Fetch(coordinator.handle_fetch(&request).await.into())
        }
        Trigger::Message { data } => TriggerResult::Message(coordinator.on_message(&data).await?),
    };

    Ok(result)
}

//! Action records persisted for every command that reaches a collaborator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// What kind of action a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Device,
    Schedule,
}

/// Final status of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Done,
    Failed,
    Scheduled,
}

/// One interpreted command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: Uuid,
    pub created_at: NaiveDateTime,
    pub command_text: String,
    pub kind: ActionKind,
    /// Device name or reminder task
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<NaiveDateTime>,
    pub status: ActionStatus,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ActionRecord {
    /// Create a record with a fresh id and empty metadata.
    pub fn new(
        created_at: NaiveDateTime,
        command_text: impl Into<String>,
        kind: ActionKind,
        target: impl Into<String>,
        status: ActionStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            command_text: command_text.into(),
            kind,
            target: target.into(),
            scheduled_time: None,
            status,
            metadata: Map::new(),
        }
    }

    pub fn with_scheduled_time(mut self, at: NaiveDateTime) -> Self {
        self.scheduled_time = Some(at);
        self
    }

    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

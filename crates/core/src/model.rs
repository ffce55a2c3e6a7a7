#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskState {
    /// Boundary parser for caller-supplied state strings. Unknown values
    /// are a caller error and never reach the mutation engine.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One task. Children are owned exclusively by their parent. A node holds
/// no parent link and no identifier: its position among its siblings is
/// the identifier, recomputed on every lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub description: String,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub subtasks: Vec<TaskNode>,
}

impl TaskNode {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            state: TaskState::Pending,
            subtasks: Vec::new(),
        }
    }
}

use serde::{Deserialize, Serialize};

/// Identifier of a persisted task-log row. One row per execution attempt.
pub type TaskLogId = i64;

/// Lifecycle state of a persisted task log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskLogStatus {
    /// Queued behind another run of the same task.
    Waiting,
    /// Dispatched and not yet finished.
    Running,
    /// Finished without error.
    Success,
    /// Finished with an error (logical, transport or timeout).
    Fail,
    /// Stopped on request.
    Cancel,
}

impl TaskLogStatus {
    /// Returns `true` once the log will not transition any further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskLogStatus::Success | TaskLogStatus::Fail | TaskLogStatus::Cancel
        )
    }
}

/// Persisted record of one execution attempt, as far as the dispatcher cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLog {
    pub id: TaskLogId,
    pub status: TaskLogStatus,
    pub result: String,
}

impl TaskLog {
    pub fn running(id: TaskLogId) -> Self {
        Self {
            id,
            status: TaskLogStatus::Running,
            result: String::new(),
        }
    }

    pub fn apply(&mut self, update: TaskLogUpdate) {
        self.status = update.status;
        self.result = update.result;
    }
}

/// Partial update applied to a task log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLogUpdate {
    pub status: TaskLogStatus,
    pub result: String,
}

impl TaskLogUpdate {
    pub fn new(status: TaskLogStatus, result: impl Into<String>) -> Self {
        Self {
            status,
            result: result.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskLogStatus::Success.is_terminal());
        assert!(TaskLogStatus::Fail.is_terminal());
        assert!(TaskLogStatus::Cancel.is_terminal());

        assert!(!TaskLogStatus::Running.is_terminal());
        assert!(!TaskLogStatus::Waiting.is_terminal());
    }

    #[test]
    fn apply_overwrites_status_and_result() {
        let mut log = TaskLog::running(4);
        log.apply(TaskLogUpdate::new(TaskLogStatus::Fail, "exit status 1"));
        assert_eq!(log.status, TaskLogStatus::Fail);
        assert_eq!(log.result, "exit status 1");
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_string(&TaskLogStatus::Cancel).unwrap();
        assert_eq!(json, r#""cancel""#);

        let back: TaskLogStatus = serde_json::from_str(r#""running""#).unwrap();
        assert_eq!(back, TaskLogStatus::Running);
    }
}

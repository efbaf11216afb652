use async_trait::async_trait;
use cronx_model::{TaskLog, TaskLogId, TaskLogStatus, TaskLogUpdate};
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("task log {0} not found")]
    NotFound(TaskLogId),

    #[error("task log backend: {0}")]
    Backend(String),
}

/// Persistence seam for task logs.
///
/// The dispatcher core only ever writes status/result pairs and, for the
/// conditional reconcile policy, reads the current status back.
#[async_trait]
pub trait TaskLogStore: Send + Sync + 'static {
    /// Apply `update` to log `id`; [`StoreError::NotFound`] when there is no such row.
    async fn update(&self, id: TaskLogId, update: TaskLogUpdate) -> Result<(), StoreError>;

    /// Current status of log `id`, or `None` when it does not exist.
    async fn status(&self, id: TaskLogId) -> Result<Option<TaskLogStatus>, StoreError>;
}

/// Task logs kept in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryTaskLogStore {
    logs: DashMap<TaskLogId, TaskLog>,
}

impl MemoryTaskLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, log: TaskLog) -> Option<TaskLog> {
        self.logs.insert(log.id, log)
    }

    pub fn get(&self, id: TaskLogId) -> Option<TaskLog> {
        self.logs.get(&id).map(|l| l.value().clone())
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

#[async_trait]
impl TaskLogStore for MemoryTaskLogStore {
    async fn update(&self, id: TaskLogId, update: TaskLogUpdate) -> Result<(), StoreError> {
        let mut log = self.logs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        log.apply(update);
        Ok(())
    }

    async fn status(&self, id: TaskLogId) -> Result<Option<TaskLogStatus>, StoreError> {
        Ok(self.logs.get(&id).map(|l| l.status))
    }
}

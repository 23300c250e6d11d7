//! Deferred work queue. Pushes and dead-socket cleanup are never run inline
//! where they were triggered; they are submitted here and drained FIFO by the
//! push engine worker, so a registry walk is never mutated mid-iteration.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::registry::ConnectionEntry;

#[derive(Debug, Clone)]
pub enum Task {
    PushUser { team_id: i32, user_id: i32 },
    PushTeam { team_id: i32 },
    PushAll,
    PushScoreboard,
    PushHistory,
    Unregister(Arc<ConnectionEntry>),
}

/// Cloneable submit handle. Submission order is delivery order.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
}

impl TaskQueue {
    pub fn submit(&self, task: Task) {
        if self.tx.send(task).is_err() {
            warn!("task queue closed, dropping task");
        }
    }
}

pub fn task_channel() -> (TaskQueue, mpsc::UnboundedReceiver<Task>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskQueue { tx }, rx)
}

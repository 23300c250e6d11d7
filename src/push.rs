//! Push engine: resolves a scope to live connections, delivers unread
//! notifications and refresh signals, and drains the deferred task queue.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error};

use crate::dispatch::Dispatcher;
use crate::registry::ConnectionRegistry;
use crate::sched::Task;
use crate::store::{NotificationStore, StoreError};

/// Refresh signals; exact shapes are part of the client contract.
pub const SCOREBOARD_REFRESH: &str = r#"{"update":["scoreboard"]}"#;
pub const HISTORY_REFRESH: &str = r#"{"update":["history"]}"#;

pub struct PushEngine {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn NotificationStore>,
    dispatcher: Dispatcher,
}

impl PushEngine {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn NotificationStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            registry,
            store,
            dispatcher,
        }
    }

    /// Deliver all unread notifications to every open socket of one user,
    /// oldest first, then mark them viewed. With zero open connections the
    /// store is left untouched, so delivery happens on a later cycle instead.
    /// Mark-viewed is per notification: if persisting the flag fails after a
    /// send, the notification is resent next cycle (at-least-once).
    pub fn push_user(&self, team_id: i32, user_id: i32) -> Result<(), StoreError> {
        let connections = self.registry.connections_for(team_id, user_id);
        if connections.is_empty() {
            debug!(user_id, "no open connections, leaving notifications unread");
            return Ok(());
        }
        let notifications = self.store.unread_by_user(user_id)?;
        debug!(user_id, count = notifications.len(), "pushing unread notifications");
        for notification in &notifications {
            let payload = notification.to_wire().to_string();
            for connection in &connections {
                self.dispatcher.safe_send(connection, &payload);
            }
            self.store.mark_viewed(notification.id)?;
        }
        Ok(())
    }

    pub fn push_team(&self, team_id: i32) -> Result<(), StoreError> {
        for user_id in self.registry.user_ids(team_id) {
            self.push_user(team_id, user_id)?;
        }
        Ok(())
    }

    pub fn push_all(&self) -> Result<(), StoreError> {
        for team_id in self.registry.team_ids() {
            self.push_team(team_id)?;
        }
        Ok(())
    }

    pub fn push_scoreboard(&self) {
        for connection in self.registry.all_connections() {
            self.dispatcher.safe_send(&connection, SCOREBOARD_REFRESH);
        }
    }

    pub fn push_history(&self) {
        for connection in self.registry.all_connections() {
            self.dispatcher.safe_send(&connection, HISTORY_REFRESH);
        }
    }

    /// Execute one deferred task. Store failures are logged here: the event
    /// call that scheduled the push has already returned, and the unread rows
    /// survive for the next cycle.
    pub fn process(&self, task: Task) {
        let result = match task {
            Task::PushUser { team_id, user_id } => self.push_user(team_id, user_id),
            Task::PushTeam { team_id } => self.push_team(team_id),
            Task::PushAll => self.push_all(),
            Task::PushScoreboard => {
                self.push_scoreboard();
                Ok(())
            }
            Task::PushHistory => {
                self.push_history();
                Ok(())
            }
            Task::Unregister(connection) => {
                self.registry.unregister(&connection);
                Ok(())
            }
        };
        if let Err(e) = result {
            error!("push task failed: {:?}", e);
        }
    }

    /// Worker loop: drain tasks in submission order until every submit
    /// handle is gone.
    pub async fn run(self, mut rx: UnboundedReceiver<Task>) {
        while let Some(task) = rx.recv().await {
            self.process(task);
        }
    }
}

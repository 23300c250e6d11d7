//! Connection registry: indexes live notify sockets by (team, user) with a
//! separate bucket for anonymous scoreboard viewers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use crate::models::User;

/// Outbound buffer per connection; beyond this, sends are dropped.
pub const OUTBOUND_BUFFER: usize = 64;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(0);

fn next_conn_id() -> u64 {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

/// One live transport session. `team_id == None` means an anonymous public
/// viewer; `user_id` is meaningful only when `team_id` is set. The registry
/// indexes the entry; the socket task owns the actual teardown.
#[derive(Debug)]
pub struct ConnectionEntry {
    pub conn_id: u64,
    pub team_id: Option<i32>,
    pub user_id: Option<i32>,
    pub tx: mpsc::Sender<String>,
    closed: Notify,
}

impl ConnectionEntry {
    /// Returns the entry and the receiver for the socket's send task.
    pub fn new(
        team_id: Option<i32>,
        user_id: Option<i32>,
    ) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        let entry = Arc::new(Self {
            conn_id: next_conn_id(),
            team_id,
            user_id,
            tx,
            closed: Notify::new(),
        });
        (entry, rx)
    }

    /// Ask the owning socket task to close this connection.
    pub fn close(&self) {
        self.closed.notify_one();
    }

    /// Completes once `close` has been called.
    pub async fn closed(&self) {
        self.closed.notified().await;
    }
}

/// Process-wide index of live connections. Thread-safe; shared via Arc. One
/// instance is constructed at startup and handed to the dispatcher, push
/// engine and transport layer.
pub struct ConnectionRegistry {
    /// team_id -> user_id -> conn_id -> entry. Set semantics via conn_id.
    auth: dashmap::DashMap<i32, HashMap<i32, HashMap<u64, Arc<ConnectionEntry>>>>,
    /// Anonymous connections, keyed by conn_id.
    public: dashmap::DashMap<u64, Arc<ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            auth: dashmap::DashMap::new(),
            public: dashmap::DashMap::new(),
        }
    }

    /// Insert a connection. Idempotent: re-registering the same connection is
    /// harmless. An entry missing either half of its identity goes to the
    /// public bucket, never the per-team index.
    pub fn register(&self, connection: Arc<ConnectionEntry>) {
        match (connection.team_id, connection.user_id) {
            (Some(team_id), Some(user_id)) => {
                self.auth
                    .entry(team_id)
                    .or_default()
                    .entry(user_id)
                    .or_default()
                    .insert(connection.conn_id, connection.clone());
            }
            _ => {
                self.public.insert(connection.conn_id, connection);
            }
        }
    }

    /// Remove a connection. Unknown buckets or an already-removed entry are a
    /// benign no-op: the dispatcher and the socket task may both try.
    pub fn unregister(&self, connection: &ConnectionEntry) {
        match (connection.team_id, connection.user_id) {
            (Some(team_id), Some(user_id)) => {
                if let Some(mut team_users) = self.auth.get_mut(&team_id) {
                    if let Some(conns) = team_users.get_mut(&user_id) {
                        conns.remove(&connection.conn_id);
                        if conns.is_empty() {
                            team_users.remove(&user_id);
                        }
                    }
                }
                self.auth.remove_if(&team_id, |_, team_users| team_users.is_empty());
            }
            _ => {
                self.public.remove(&connection.conn_id);
            }
        }
    }

    /// Open connections for one user; empty if team or user is unknown.
    pub fn connections_for(&self, team_id: i32, user_id: i32) -> Vec<Arc<ConnectionEntry>> {
        self.auth
            .get(&team_id)
            .and_then(|team_users| {
                team_users
                    .get(&user_id)
                    .map(|conns| conns.values().cloned().collect())
            })
            .unwrap_or_default()
    }

    pub fn is_online(&self, user: &User) -> bool {
        !self.connections_for(user.team.id, user.id).is_empty()
    }

    pub fn team_ids(&self) -> Vec<i32> {
        self.auth.iter().map(|entry| *entry.key()).collect()
    }

    pub fn user_ids(&self, team_id: i32) -> Vec<i32> {
        self.auth
            .get(&team_id)
            .map(|team_users| team_users.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of every connection at call time: authenticated first (all
    /// teams, all users per team), then the public bucket. Mutations after
    /// the call do not affect the returned vec.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionEntry>> {
        let mut connections = Vec::new();
        for team in self.auth.iter() {
            for conns in team.value().values() {
                connections.extend(conns.values().cloned());
            }
        }
        connections.extend(self.public.iter().map(|entry| entry.value().clone()));
        connections
    }

    /// Signal every open socket of a user to close (logout/deauth). The
    /// socket tasks unregister themselves on the way out.
    pub fn close_user_connections(&self, user: &User) {
        for connection in self.connections_for(user.team.id, user.id) {
            connection.close();
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

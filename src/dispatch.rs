//! Single-connection delivery with self-healing on closed sockets.

use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::metrics;
use crate::registry::ConnectionEntry;
use crate::sched::{Task, TaskQueue};

#[derive(Clone)]
pub struct Dispatcher {
    queue: TaskQueue,
}

impl Dispatcher {
    pub fn new(queue: TaskQueue) -> Self {
        Self { queue }
    }

    /// Deliver an already-serialized payload to one connection. A closed
    /// socket is expected: the error is swallowed and an `Unregister` task is
    /// scheduled instead of mutating the registry inside the send path. A
    /// full outbound buffer kills only this send attempt; the caller's push
    /// loop carries on with the next connection.
    pub fn safe_send(&self, connection: &Arc<ConnectionEntry>, message: &str) {
        match connection.tx.try_send(message.to_string()) {
            Ok(()) => metrics::MESSAGES_SENT.inc(),
            Err(TrySendError::Closed(_)) => {
                debug!(conn_id = connection.conn_id, "socket closed, scheduling unregister");
                metrics::DEAD_CONNECTIONS.inc();
                self.queue.submit(Task::Unregister(connection.clone()));
            }
            Err(TrySendError::Full(_)) => {
                warn!(conn_id = connection.conn_id, "outbound buffer full, dropping message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::task_channel;

    #[test]
    fn closed_socket_is_swallowed_and_unregister_scheduled() {
        let (queue, mut rx) = task_channel();
        let dispatcher = Dispatcher::new(queue);
        let (entry, socket_rx) = ConnectionEntry::new(Some(1), Some(10));
        drop(socket_rx);

        dispatcher.safe_send(&entry, "hello");

        match rx.try_recv() {
            Ok(Task::Unregister(conn)) => assert_eq!(conn.conn_id, entry.conn_id),
            other => panic!("expected unregister task, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_buffer_drops_message_without_unregister() {
        let (queue, mut rx) = task_channel();
        let dispatcher = Dispatcher::new(queue);
        let (entry, _socket_rx) = ConnectionEntry::new(Some(1), Some(10));

        // fill the outbound buffer, then one more
        for _ in 0..crate::registry::OUTBOUND_BUFFER {
            dispatcher.safe_send(&entry, "msg");
        }
        dispatcher.safe_send(&entry, "overflow");

        assert!(rx.try_recv().is_err());
    }
}

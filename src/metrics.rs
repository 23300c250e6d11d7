//! Prometheus counters for the notify layer, exposed on /metrics.

use prometheus::{register_int_counter, IntCounter};
use std::sync::LazyLock;

pub static NOTIFICATIONS_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "notify_notifications_created_total",
        "Notification rows persisted"
    )
    .expect("register notify_notifications_created_total")
});

pub static MESSAGES_SENT: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "notify_messages_sent_total",
        "Payloads handed to notify sockets"
    )
    .expect("register notify_messages_sent_total")
});

pub static DEAD_CONNECTIONS: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "notify_dead_connections_total",
        "Closed sockets detected on send and reaped"
    )
    .expect("register notify_dead_connections_total")
});

pub fn render() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buf) {
        tracing::error!("encode metrics: {:?}", e);
    }
    String::from_utf8(buf).unwrap_or_default()
}

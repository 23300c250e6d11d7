use std::sync::Arc;

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

pub mod dispatch;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod push;
pub mod registry;
pub mod sched;
pub mod schema;
pub mod store;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<ConnectionManager<PgConnection>>,
    pub registry: Arc<registry::ConnectionRegistry>,
    pub events: Arc<events::EventManager>,
    pub queue: sched::TaskQueue,
}

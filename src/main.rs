use axum::{
    routing::{get, post},
    Router,
};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use scorebox_backend::dispatch::Dispatcher;
use scorebox_backend::events::{EventManager, GameOptions};
use scorebox_backend::push::PushEngine;
use scorebox_backend::registry::ConnectionRegistry;
use scorebox_backend::store::{NotificationStore, PgNotificationStore};
use scorebox_backend::{handlers, metrics, sched, AppState};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let manager = ConnectionManager::<PgConnection>::new(&database_url);
    let pool = Pool::builder()
        .build(manager)
        .expect("Failed to create pool");
    {
        let conn = &mut pool.get().expect("Failed to check out connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
    }

    let registry = Arc::new(ConnectionRegistry::new());
    let store: Arc<dyn NotificationStore> = Arc::new(PgNotificationStore::new(pool.clone()));
    let (queue, task_rx) = sched::task_channel();
    let engine = PushEngine::new(registry.clone(), store.clone(), Dispatcher::new(queue.clone()));
    let _worker = tokio::spawn(engine.run(task_rx));

    let options = GameOptions {
        teams: std::env::var("GAME_TEAMS").map(|v| v != "false").unwrap_or(true),
    };
    let events = Arc::new(EventManager::new(store, queue.clone(), options));

    let state = AppState {
        db: pool,
        registry,
        events,
        queue,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .route("/ws", get(handlers::ws::ws_handler))
        .route("/admin/broadcast", post(handlers::admin::post_broadcast))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> &'static str {
    "ok"
}

async fn render_metrics() -> String {
    metrics::render()
}

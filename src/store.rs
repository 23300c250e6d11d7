//! Notification persistence boundary: trait consumed by the push engine and
//! event translator, plus the Postgres implementation.

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tracing::debug;

use crate::metrics;
use crate::models::{GameLevel, NewNotification, Notification, Severity, Team, User};
use crate::schema::{game_levels, notifications, users};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

/// Persistence operations the notify core needs. Team and broadcast scopes
/// are expanded into one row per recipient user at creation time, so the
/// per-row `viewed` flag tracks each recipient independently. Creation
/// methods return the number of rows written and fail loudly; they never
/// silently drop a notification.
pub trait NotificationStore: Send + Sync {
    fn create_for_user(
        &self,
        user: &User,
        title: &str,
        body: &str,
        severity: Severity,
    ) -> Result<usize, StoreError>;

    fn create_for_team(
        &self,
        team: &Team,
        title: &str,
        body: &str,
        severity: Severity,
    ) -> Result<usize, StoreError>;

    fn create_broadcast(
        &self,
        title: &str,
        body: &str,
        severity: Severity,
    ) -> Result<usize, StoreError>;

    /// Unread notifications for one user, oldest created first. Empty vec,
    /// never an error, for a user with none.
    fn unread_by_user(&self, user_id: i32) -> Result<Vec<Notification>, StoreError>;

    /// Idempotent: marking an already-viewed or missing row is a no-op.
    /// `viewed` is one-way; nothing in this subsystem resets it.
    fn mark_viewed(&self, notification_id: i64) -> Result<(), StoreError>;

    fn game_levels(&self) -> Result<Vec<GameLevel>, StoreError>;
}

pub struct PgNotificationStore {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PgNotificationStore {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    fn conn(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }

    fn insert_rows(
        conn: &mut PgConnection,
        rows: &[NewNotification],
    ) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let n = diesel::insert_into(notifications::table)
            .values(rows)
            .execute(conn)?;
        metrics::NOTIFICATIONS_CREATED.inc_by(n as u64);
        Ok(n)
    }
}

impl NotificationStore for PgNotificationStore {
    fn create_for_user(
        &self,
        user: &User,
        title: &str,
        body: &str,
        severity: Severity,
    ) -> Result<usize, StoreError> {
        let conn = &mut self.conn()?;
        let row = NewNotification {
            user_id: user.id,
            team_id: Some(user.team.id),
            title: title.to_string(),
            body: body.to_string(),
            severity,
            viewed: false,
            created_at: Utc::now(),
        };
        Self::insert_rows(conn, &[row])
    }

    fn create_for_team(
        &self,
        team: &Team,
        title: &str,
        body: &str,
        severity: Severity,
    ) -> Result<usize, StoreError> {
        use crate::schema::users::dsl;
        let conn = &mut self.conn()?;
        let member_ids: Vec<i32> = users::table
            .filter(dsl::team_id.eq(team.id))
            .select(dsl::id)
            .load(conn)?;
        let now = Utc::now();
        let rows: Vec<NewNotification> = member_ids
            .into_iter()
            .map(|user_id| NewNotification {
                user_id,
                team_id: Some(team.id),
                title: title.to_string(),
                body: body.to_string(),
                severity,
                viewed: false,
                created_at: now,
            })
            .collect();
        Self::insert_rows(conn, &rows)
    }

    fn create_broadcast(
        &self,
        title: &str,
        body: &str,
        severity: Severity,
    ) -> Result<usize, StoreError> {
        use crate::schema::users::dsl;
        let conn = &mut self.conn()?;
        let recipients: Vec<(i32, Option<i32>)> = users::table
            .select((dsl::id, dsl::team_id))
            .load(conn)?;
        let now = Utc::now();
        let rows: Vec<NewNotification> = recipients
            .into_iter()
            .map(|(user_id, team_id)| NewNotification {
                user_id,
                team_id,
                title: title.to_string(),
                body: body.to_string(),
                severity,
                viewed: false,
                created_at: now,
            })
            .collect();
        Self::insert_rows(conn, &rows)
    }

    fn unread_by_user(&self, user_id: i32) -> Result<Vec<Notification>, StoreError> {
        use crate::schema::notifications::dsl;
        let conn = &mut self.conn()?;
        let rows = notifications::table
            .filter(dsl::user_id.eq(user_id).and(dsl::viewed.eq(false)))
            .order((dsl::created_at.asc(), dsl::id.asc()))
            .select(Notification::as_select())
            .load(conn)?;
        Ok(rows)
    }

    fn mark_viewed(&self, notification_id: i64) -> Result<(), StoreError> {
        use crate::schema::notifications::dsl;
        let conn = &mut self.conn()?;
        let updated = diesel::update(notifications::table.filter(dsl::id.eq(notification_id)))
            .set(dsl::viewed.eq(true))
            .execute(conn)?;
        if updated == 0 {
            debug!(notification_id, "mark viewed matched no row");
        }
        Ok(())
    }

    fn game_levels(&self) -> Result<Vec<GameLevel>, StoreError> {
        use crate::schema::game_levels::dsl;
        let conn = &mut self.conn()?;
        let rows = game_levels::table
            .order(dsl::id.asc())
            .select(GameLevel::as_select())
            .load(conn)?;
        Ok(rows)
    }
}

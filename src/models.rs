use crate::schema;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

/// Notification category, matching the `notification_severity` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, DbEnum)]
#[serde(rename_all = "lowercase")]
#[ExistingTypePath = "crate::schema::sql_types::NotificationSeverity"]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = schema::notifications)]
pub struct Notification {
    pub id: i64,
    pub user_id: i32,
    pub team_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Field-for-field representation pushed to notify sockets. The shape is
    /// part of the client contract; do not rename keys.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "title": self.title,
            "body": self.body,
            "severity": self.severity,
            "timestamp": self.created_at,
        })
    }
}

/// For inserting a notification row. `id` comes from the DB sequence; set
/// `created_at` (`Utc::now()`) at creation so a batch shares one timestamp.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::notifications)]
pub struct NewNotification {
    pub user_id: i32,
    pub team_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub viewed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = schema::game_levels)]
pub struct GameLevel {
    pub id: i32,
    pub name: String,
}

// Domain objects below are read-only inputs to the event translator. They are
// produced by the game's own handlers; this subsystem never mutates them.

#[derive(Debug, Clone)]
pub struct Team {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub handle: String,
    pub team: Team,
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub id: i32,
    pub name: String,
    pub box_name: String,
    pub game_level_id: i32,
}

#[derive(Debug, Clone)]
pub struct Hint {
    pub id: i32,
    pub box_name: String,
    pub game_level_id: i32,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct PasteBin {
    pub name: String,
}

/// Who performed a scoring action. Resolved once where the domain event enters
/// the translator; a flag capture may be credited to a user or directly to a
/// team (e.g. botnet captures).
#[derive(Debug, Clone, Copy)]
pub enum Actor<'a> {
    User(&'a User),
    Team(&'a Team),
}

impl Actor<'_> {
    pub fn team(&self) -> &Team {
        match self {
            Actor::User(user) => &user.team,
            Actor::Team(team) => team,
        }
    }
}

//! Event translator: one entry point per domain event. Each builds the
//! user-facing message, persists notification rows with the right scope and
//! severity, and schedules pushes on the deferred queue. Store failures
//! propagate to the caller; transport failures never reach here.

use std::sync::Arc;

use crate::models::{Actor, FileUpload, Flag, GameLevel, Hint, Item, PasteBin, Severity, Team, User};
use crate::sched::{Task, TaskQueue};
use crate::store::{NotificationStore, StoreError};

#[derive(Debug, Clone, Copy)]
pub struct GameOptions {
    /// False puts the game in solo mode: messages name the acting party by
    /// team display name instead of user handle.
    pub teams: bool,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self { teams: true }
    }
}

pub struct EventManager {
    store: Arc<dyn NotificationStore>,
    queue: TaskQueue,
    options: GameOptions,
}

impl EventManager {
    pub fn new(store: Arc<dyn NotificationStore>, queue: TaskQueue, options: GameOptions) -> Self {
        Self {
            store,
            queue,
            options,
        }
    }

    /// " (<level name>)" when more than one game level exists, "" otherwise.
    fn level_suffix(&self, game_level_id: i32) -> Result<String, StoreError> {
        let levels = self.store.game_levels()?;
        if levels.len() > 1 {
            if let Some(level) = levels.iter().find(|l| l.id == game_level_id) {
                return Ok(format!(" ({})", level.name));
            }
        }
        Ok(String::new())
    }

    fn push_team_and_scoreboard(&self, team_id: i32) {
        self.queue.submit(Task::PushTeam { team_id });
        self.queue.submit(Task::PushScoreboard);
    }

    fn push_all_and_scoreboard(&self) {
        self.queue.submit(Task::PushAll);
        self.queue.submit(Task::PushScoreboard);
    }

    /// Admin adjusted a team's score by hand.
    pub fn admin_score_update(
        &self,
        team: &Team,
        message: &str,
        value: i64,
    ) -> Result<(), StoreError> {
        let severity = if value < 0 {
            Severity::Warning
        } else {
            Severity::Success
        };
        let body = format!("{message} ({value})");
        self.store
            .create_for_team(team, "Admin Update", &body, severity)?;
        self.push_team_and_scoreboard(team.id);
        Ok(())
    }

    /// Generic score change: refresh scoreboards, nothing persisted.
    pub fn score_updated(&self) {
        self.queue.submit(Task::PushScoreboard);
    }

    /// Capture history changed (e.g. a flag was revoked): refresh that view.
    pub fn history_updated(&self) {
        self.queue.submit(Task::PushHistory);
    }

    pub fn admin_message(&self, message: &str) -> Result<(), StoreError> {
        self.store
            .create_broadcast("Admin Message", message, Severity::Info)?;
        self.push_all_and_scoreboard();
        Ok(())
    }

    pub fn flag_decayed(&self, team: &Team, flag: &Flag) -> Result<(), StoreError> {
        let body = format!(
            "The value of challenge {} has decreased due to other team captures - score adjusted.",
            flag.name
        );
        self.store
            .create_for_team(team, "Flag Value Decreased", &body, Severity::Info)?;
        self.queue.submit(Task::PushTeam { team_id: team.id });
        Ok(())
    }

    pub fn flag_captured(&self, player: Actor<'_>, flag: &Flag) -> Result<(), StoreError> {
        let team = player.team();
        let mut body = match player {
            Actor::User(user) if self.options.teams => format!(
                "{} ({}) has completed \"{}\" in {}",
                user.handle, team.name, flag.name, flag.box_name
            ),
            _ => format!(
                "{} has completed \"{}\" in {}",
                team.name, flag.name, flag.box_name
            ),
        };
        body.push_str(&self.level_suffix(flag.game_level_id)?);
        self.store
            .create_broadcast("Flag Capture", &body, Severity::Success)?;
        self.push_all_and_scoreboard();
        Ok(())
    }

    pub fn bot_added(&self, user: &User, count: usize) -> Result<(), StoreError> {
        let body = if self.options.teams {
            format!(
                "{} ({}) added a new bot; total number of bots is now {}",
                user.handle, user.team.name, count
            )
        } else {
            format!(
                "{} added a new bot; total number of bots is now {}",
                user.team.name, count
            )
        };
        self.store
            .create_broadcast("Bot added", &body, Severity::Info)?;
        self.push_all_and_scoreboard();
        Ok(())
    }

    pub fn bot_scored(&self, team: &Team, message: Option<&str>) -> Result<(), StoreError> {
        let body = match message {
            Some(message) => message.to_string(),
            None => format!("{} botnet has scored", team.name),
        };
        self.store
            .create_for_team(team, "Botnet Scored", &body, Severity::Success)?;
        self.push_team_and_scoreboard(team.id);
        Ok(())
    }

    pub fn hint_taken(&self, user: &User, hint: &Hint) -> Result<(), StoreError> {
        let mut body = if self.options.teams {
            format!("{} has taken a hint for {}", user.handle, hint.box_name)
        } else {
            format!("{} has taken a hint for {}", user.team.name, hint.box_name)
        };
        body.push_str(&self.level_suffix(hint.game_level_id)?);
        self.store
            .create_for_team(&user.team, "Hint Taken", &body, Severity::Info)?;
        self.push_team_and_scoreboard(user.team.id);
        Ok(())
    }

    pub fn flag_penalty(&self, user: &User, flag: &Flag) -> Result<(), StoreError> {
        let mut body = if self.options.teams {
            format!(
                "{} was penalized on '{}' in {}",
                user.handle, flag.name, flag.box_name
            )
        } else {
            format!(
                "{} was penalized on '{}' in {}",
                user.team.name, flag.name, flag.box_name
            )
        };
        body.push_str(&self.level_suffix(flag.game_level_id)?);
        self.store
            .create_for_team(&user.team, "Flag Penalty", &body, Severity::Warning)?;
        self.push_team_and_scoreboard(user.team.id);
        Ok(())
    }

    pub fn level_unlocked(&self, user: &User, level: &GameLevel) -> Result<(), StoreError> {
        let body = format!("{} unlocked {}.", user.team.name, level.name);
        self.store
            .create_broadcast("Level Unlocked", &body, Severity::Success)?;
        self.push_all_and_scoreboard();
        Ok(())
    }

    pub fn item_purchased(&self, user: &User, item: &Item) -> Result<(), StoreError> {
        let body = format!("{} purchased {} from the black market", user.handle, item.name);
        self.store
            .create_for_team(&user.team, "Upgrade Purchased", &body, Severity::Success)?;
        self.push_team_and_scoreboard(user.team.id);
        Ok(())
    }

    pub fn player_arrested(&self, user: &User, target: &User) -> Result<(), StoreError> {
        let body = if self.options.teams {
            format!(
                "{} ({}) called the SWAT team on {} ({}).",
                user.handle, user.team.name, target.handle, target.team.name
            )
        } else {
            format!("{} called the SWAT team on {}.", user.handle, target.handle)
        };
        self.store
            .create_broadcast("Player Arrested!", &body, Severity::Info)?;
        self.push_all_and_scoreboard();
        Ok(())
    }

    pub fn user_joined_team(&self, user: &User) -> Result<(), StoreError> {
        if self.options.teams {
            let body = format!("{} has joined the {} team", user.handle, user.team.name);
            self.store
                .create_for_team(&user.team, "New Team Member", &body, Severity::Info)?;
        } else {
            let body = format!("{} has joined the game", user.handle);
            self.store
                .create_for_team(&user.team, "New Player", &body, Severity::Info)?;
        }
        self.push_team_and_scoreboard(user.team.id);
        Ok(())
    }

    pub fn team_file_shared(
        &self,
        user: &User,
        team: &Team,
        file_upload: &FileUpload,
    ) -> Result<(), StoreError> {
        let body = format!("{} has shared the file '{}'", user.handle, file_upload.file_name);
        self.store
            .create_for_team(team, "File Share", &body, Severity::Info)?;
        self.queue.submit(Task::PushTeam { team_id: team.id });
        Ok(())
    }

    pub fn team_paste_shared(
        &self,
        user: &User,
        team: &Team,
        paste_bin: &PasteBin,
    ) -> Result<(), StoreError> {
        let body = format!("{} posted '{}' to the team paste bin", user.handle, paste_bin.name);
        self.store
            .create_for_team(team, "Text Share", &body, Severity::Info)?;
        self.queue.submit(Task::PushTeam { team_id: team.id });
        Ok(())
    }

    /// Two notifications, one push cycle: the victim learns their password
    /// fell, everyone else sees who profited.
    pub fn cracked_password(
        &self,
        cracker: &User,
        victim: &User,
        password: &str,
        value: i64,
    ) -> Result<(), StoreError> {
        let victim_body = format!(
            "Your password '{}' was cracked by {}",
            password, cracker.handle
        );
        self.store
            .create_for_user(victim, "Security Breach", &victim_body, Severity::Error)?;
        let body = format!(
            "{} hacked {}'s bank account and stole ${}",
            cracker.handle, victim.team.name, value
        );
        self.store
            .create_broadcast("Password Cracked", &body, Severity::Success)?;
        self.push_all_and_scoreboard();
        Ok(())
    }
}

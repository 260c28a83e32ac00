//! Player profiles and match statistics
//!
//! The client only talks to a profile store through [`ProfileStore`]. The
//! in-memory store is a non-durable stand-in used for offline play and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::sync::MatchSummary;

pub const LEADERBOARD_SIZE: usize = 50;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 4;
const FORBIDDEN_CHARS: [char; 7] = ['<', '>', '"', '\'', '&', '/', '\\'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Username must be at least 3 characters")]
    UsernameTooShort,
    #[error("Password must be at least 4 characters")]
    PasswordTooShort,
    #[error("Invalid characters in credentials")]
    InvalidCharacters,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Invalid username or password")]
    InvalidLogin,
    #[error("User not found")]
    UnknownUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

/// Lifetime statistics of one player. Durations are whole seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub fastest_win: Option<u64>,
    pub longest_game: Option<u64>,
    pub win_streak: u32,
    pub best_win_streak: u32,
    pub total_playtime: u64,
}

impl PlayerStats {
    /// Folds one finished game into the totals.
    pub fn record(&mut self, delta: &StatsDelta) {
        self.games_played += 1;
        self.total_playtime += delta.duration_secs;
        self.longest_game = Some(
            self.longest_game
                .map_or(delta.duration_secs, |longest| longest.max(delta.duration_secs)),
        );

        if delta.won {
            self.wins += 1;
            self.win_streak += 1;
            self.best_win_streak = self.best_win_streak.max(self.win_streak);
            self.fastest_win = Some(
                self.fastest_win
                    .map_or(delta.duration_secs, |fastest| fastest.min(delta.duration_secs)),
            );
        } else {
            self.losses += 1;
            self.win_streak = 0;
        }
    }

    /// Percentage of games won, rounded to one decimal.
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        let rate = f64::from(self.wins) / f64::from(self.games_played) * 100.0;
        (rate * 10.0).round() / 10.0
    }
}

/// One game's contribution to a player's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDelta {
    pub won: bool,
    pub duration_secs: u64,
    pub moves: u32,
}

impl From<&MatchSummary> for StatsDelta {
    fn from(summary: &MatchSummary) -> Self {
        Self {
            won: summary.won,
            duration_secs: summary.duration.as_secs(),
            moves: summary.moves,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Login {
    pub username: String,
    pub token: SessionToken,
    pub stats: PlayerStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub fastest_win: Option<u64>,
    pub best_win_streak: u32,
}

/// Account and statistics service consulted by the client.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<(), ProfileError>;

    async fn login(&self, username: &str, password: &str) -> Result<Login, ProfileError>;

    /// Records a finished game and returns the updated totals.
    async fn update_stats(
        &self,
        username: &str,
        delta: &StatsDelta,
    ) -> Result<PlayerStats, ProfileError>;

    /// Players with at least one game, best first.
    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ProfileError>;
}

struct Account {
    username: String,
    password_hash: String,
    stats: PlayerStats,
}

/// Profile store kept in process memory. Usernames match case-insensitively.
#[derive(Default)]
pub struct MemoryProfileStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn validate_credentials(username: &str, password: &str) -> Result<(), ProfileError> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ProfileError::UsernameTooShort);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ProfileError::PasswordTooShort);
    }
    if username
        .chars()
        .chain(password.chars())
        .any(|c| FORBIDDEN_CHARS.contains(&c))
    {
        return Err(ProfileError::InvalidCharacters);
    }
    Ok(())
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn register(&self, username: &str, password: &str) -> Result<(), ProfileError> {
        validate_credentials(username, password)?;

        let mut accounts = self.accounts.write().await;
        let key = username.to_lowercase();
        if accounts.contains_key(&key) {
            return Err(ProfileError::UsernameTaken);
        }
        accounts.insert(
            key,
            Account {
                username: username.to_string(),
                password_hash: hash_password(password),
                stats: PlayerStats::default(),
            },
        );
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<Login, ProfileError> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(&username.to_lowercase())
            .filter(|account| account.password_hash == hash_password(password))
            .ok_or(ProfileError::InvalidLogin)?;

        Ok(Login {
            username: account.username.clone(),
            token: SessionToken(Uuid::new_v4().simple().to_string()),
            stats: account.stats.clone(),
        })
    }

    async fn update_stats(
        &self,
        username: &str,
        delta: &StatsDelta,
    ) -> Result<PlayerStats, ProfileError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&username.to_lowercase())
            .ok_or(ProfileError::UnknownUser)?;
        account.stats.record(delta);
        Ok(account.stats.clone())
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ProfileError> {
        let accounts = self.accounts.read().await;
        let mut entries: Vec<LeaderboardEntry> = accounts
            .values()
            .filter(|account| account.stats.games_played > 0)
            .map(|account| LeaderboardEntry {
                username: account.username.clone(),
                games_played: account.stats.games_played,
                wins: account.stats.wins,
                losses: account.stats.losses,
                win_rate: account.stats.win_rate(),
                fastest_win: account.stats.fastest_win,
                best_win_streak: account.stats.best_win_streak,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then(b.win_rate.total_cmp(&a.win_rate))
                .then(b.games_played.cmp(&a.games_played))
        });
        entries.truncate(LEADERBOARD_SIZE);
        Ok(entries)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Administrative lifecycle of a match. Status never changes as a side
/// effect of ticket sales; it is edited through the match update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FootballMatch {
    /// Internal storage key. Tickets reference it; it never leaves the API.
    #[serde(skip_serializing)]
    pub id: i64,
    /// External-facing identity, assigned at creation and immutable.
    pub uuid: Uuid,
    pub title: String,
    pub match_date: DateTime<Utc>,
    pub venue: String,
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub home_team_logo: Option<String>,
    pub away_team_logo: Option<String>,
    pub total_seats: i32,
    pub available_seats: i32,
    /// Monotonic per-match counter backing seat-label allocation. Bumped in
    /// the same atomic update as the seat decrement, so labels are unique
    /// within a match.
    #[serde(skip_serializing)]
    pub seat_sequence: i32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FootballMatch {
    pub fn tickets_sold(&self) -> i32 {
        self.total_seats - self.available_seats
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TicketCategory {
    Vip,
    Premium,
    Regular,
    Economy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Active,
    Used,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ticket {
    /// Internal storage key, never exposed.
    #[serde(skip_serializing)]
    pub id: i64,
    /// External-facing identity, assigned at purchase and immutable.
    pub uuid: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub match_id: i64,
    pub match_uuid: Uuid,
    /// Snapshot of the match title at purchase time. Intentionally not kept
    /// in sync with later match edits.
    pub match_title: String,
    /// Snapshot of the match date at purchase time.
    pub match_date: DateTime<Utc>,
    pub seat_number: String,
    pub category: TicketCategory,
    pub price: Decimal,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

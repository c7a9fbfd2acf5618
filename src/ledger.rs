//! Seat-inventory ledger.
//!
//! Owns the relationship between a match's seat counters and the tickets
//! referencing it. Every rule about what a ticket may do — which status
//! transitions are legal, what a category costs, when a seat may be taken or
//! returned — lives here as plain functions. Storage backends call these
//! rules inside their critical sections, so both backends enforce exactly
//! the same state machine, and the ledger itself stays independently
//! testable against the in-memory store.
//!
//! The counters obey two invariants after every operation:
//! `0 <= available_seats <= total_seats`, and `available_seats ==
//! total_seats - count(tickets in {pending, active, used})`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{FootballMatch, MatchStatus, Ticket, TicketCategory, TicketStatus};
use crate::store::InventoryStore;

/// Failure taxonomy of the ledger. All variants surface synchronously to the
/// caller; nothing is retried or swallowed at this layer.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Entity missing, or not owned by the requesting user.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Operation not legal in the entity's current status.
    #[error("{0}")]
    InvalidState(&'static str),

    /// No remaining capacity on the match.
    #[error("no seats available for this match")]
    SeatsExhausted,

    /// The backend gave up a contended seat update. Retry policy belongs to
    /// the caller, not the ledger.
    #[error("conflicting seat update, retry the request")]
    ConcurrencyConflict,

    #[error("storage failure: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Pricing and seat labels
// ---------------------------------------------------------------------------

/// Fixed category price table, in the smallest currency unit. Applied at
/// purchase time and again when a pending ticket changes category.
pub fn price_of(category: TicketCategory) -> Decimal {
    let units: i64 = match category {
        TicketCategory::Vip => 2_500_000,
        TicketCategory::Premium => 1_500_000,
        TicketCategory::Regular => 750_000,
        TicketCategory::Economy => 350_000,
    };
    Decimal::from(units)
}

const SEATS_PER_ROW: i32 = 30;

const fn section_letter(category: TicketCategory) -> char {
    match category {
        TicketCategory::Vip => 'V',
        TicketCategory::Premium => 'P',
        TicketCategory::Regular => 'R',
        TicketCategory::Economy => 'E',
    }
}

/// Seat label for the `sequence`-th seat sold on a match (zero-based).
///
/// The sequence is allocated in the same atomic update as the seat
/// decrement, so labels are unique within a match by construction.
pub fn seat_label(category: TicketCategory, sequence: i32) -> String {
    let row = sequence / SEATS_PER_ROW + 1;
    let seat = sequence % SEATS_PER_ROW + 1;
    format!("{}{}-{}", section_letter(category), row, seat)
}

// ---------------------------------------------------------------------------
// State-machine rules
// ---------------------------------------------------------------------------

/// Whether a ticket in this status counts against the match's seat pool.
pub fn holds_seat(status: TicketStatus) -> bool {
    matches!(
        status,
        TicketStatus::Pending | TicketStatus::Active | TicketStatus::Used
    )
}

/// Cancellation is allowed from `pending` and `active` only; `used`,
/// `expired` and `cancelled` are final as far as this ledger is concerned.
pub fn cancellable(status: TicketStatus) -> bool {
    matches!(status, TicketStatus::Pending | TicketStatus::Active)
}

/// Legal status transitions driven by this ledger. `used` and `expired` are
/// entered only by out-of-scope administrative or time-based processes.
pub fn transition_allowed(from: TicketStatus, to: TicketStatus) -> bool {
    matches!(
        (from, to),
        (TicketStatus::Pending, TicketStatus::Active)
            | (TicketStatus::Pending, TicketStatus::Cancelled)
            | (TicketStatus::Active, TicketStatus::Cancelled)
    )
}

/// Uniform refusal for an illegal transition into `to`, so both storage
/// backends report the same thing.
pub fn invalid_transition(to: TicketStatus) -> LedgerError {
    LedgerError::InvalidState(match to {
        TicketStatus::Active => "only pending tickets can be confirmed",
        TicketStatus::Cancelled => "only pending or active tickets can be cancelled",
        _ => "tickets cannot enter this status",
    })
}

/// Seat label and category edits are allowed on pending tickets only.
pub fn check_updatable(status: TicketStatus) -> Result<(), LedgerError> {
    if status == TicketStatus::Pending {
        Ok(())
    } else {
        Err(LedgerError::InvalidState(
            "only pending tickets can be updated",
        ))
    }
}

/// Purchase preconditions, checked while the match row is locked.
pub fn check_purchasable(m: &FootballMatch) -> Result<(), LedgerError> {
    if m.status != MatchStatus::Upcoming {
        return Err(LedgerError::InvalidState(
            "tickets can only be purchased for an upcoming match",
        ));
    }
    if m.available_seats <= 0 {
        return Err(LedgerError::SeatsExhausted);
    }
    Ok(())
}

/// How many seats a cancellation returns to the match: one, clamped so the
/// counter never exceeds `total_seats`. Guards against double-release.
pub fn seat_return(m: &FootballMatch) -> i32 {
    if m.available_seats < m.total_seats {
        1
    } else {
        0
    }
}

/// New `available_seats` after an administrative `total_seats` edit: the
/// sold count is preserved and the remainder floored at zero.
pub fn rebalance_available(m: &FootballMatch, new_total: i32) -> i32 {
    let sold = m.total_seats - m.available_seats;
    (new_total - sold).max(0)
}

// ---------------------------------------------------------------------------
// Operation inputs
// ---------------------------------------------------------------------------

/// A purchase in flight: everything decided before the match row is locked.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub uuid: Uuid,
    pub user_id: Uuid,
    pub category: TicketCategory,
    pub price: Decimal,
}

impl TicketDraft {
    pub fn new(user_id: Uuid, category: TicketCategory) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_id,
            category,
            price: price_of(category),
        }
    }
}

/// Fully resolved ticket row, ready for insertion. Built from the locked
/// match row so the title/date snapshot and the seat label are consistent
/// with the seat decrement they accompany.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub uuid: Uuid,
    pub user_id: Uuid,
    pub match_id: i64,
    pub match_uuid: Uuid,
    pub match_title: String,
    pub match_date: DateTime<Utc>,
    pub seat_number: String,
    pub category: TicketCategory,
    pub price: Decimal,
    pub status: TicketStatus,
}

/// Snapshot-copies the match fields onto a draft. `m.seat_sequence` is the
/// slot being allocated; the caller bumps it in the same atomic update as
/// the seat decrement.
pub fn draft_ticket(m: &FootballMatch, draft: &TicketDraft) -> NewTicket {
    NewTicket {
        uuid: draft.uuid,
        user_id: draft.user_id,
        match_id: m.id,
        match_uuid: m.uuid,
        match_title: m.title.clone(),
        match_date: m.match_date,
        seat_number: seat_label(draft.category, m.seat_sequence),
        category: draft.category,
        price: draft.price,
        status: TicketStatus::Pending,
    }
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub title: String,
    pub match_date: DateTime<Utc>,
    pub venue: String,
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub home_team_logo: Option<String>,
    pub away_team_logo: Option<String>,
    pub total_seats: i32,
}

/// Administrative match edit. `total_seats` changes rebalance
/// `available_seats` through [`rebalance_available`].
#[derive(Debug, Clone, Default)]
pub struct MatchPatch {
    pub title: Option<String>,
    pub match_date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub competition: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_team_logo: Option<String>,
    pub away_team_logo: Option<String>,
    pub total_seats: Option<i32>,
    pub status: Option<MatchStatus>,
}

/// Edit to a pending ticket as resolved by the ledger: if the category
/// changed, `price` carries the recomputed amount.
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub seat_number: Option<String>,
    pub category: Option<TicketCategory>,
    pub price: Option<Decimal>,
}

/// Caller-supplied ticket edit; only pending tickets accept it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketUpdate {
    pub seat_number: Option<String>,
    pub category: Option<TicketCategory>,
}

// ---------------------------------------------------------------------------
// Listing filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSort {
    #[default]
    MatchDate,
    Title,
    CreatedAt,
    AvailableSeats,
}

impl MatchSort {
    /// Column name for the relational backend. Sorting is restricted to
    /// this fixed set; arbitrary column input never reaches SQL.
    pub fn column(self) -> &'static str {
        match self {
            MatchSort::MatchDate => "match_date",
            MatchSort::Title => "title",
            MatchSort::CreatedAt => "created_at",
            MatchSort::AvailableSeats => "available_seats",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketSort {
    #[default]
    MatchDate,
    CreatedAt,
    Price,
}

impl TicketSort {
    pub fn column(self) -> &'static str {
        match self {
            TicketSort::MatchDate => "match_date",
            TicketSort::CreatedAt => "created_at",
            TicketSort::Price => "price",
        }
    }
}

fn default_limit() -> i64 {
    10
}

fn default_page() -> i64 {
    1
}

const MAX_PAGE_LIMIT: i64 = 100;

/// Page window accepted by the list endpoints: `limit` in 1..=100, page
/// one-based. Out-of-range requests are clamped, not rejected, and the
/// clamped values are what responses echo back.
pub fn clamp_page(limit: i64, page: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGE_LIMIT), page.max(1))
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchFilter {
    pub status: Option<MatchStatus>,
    /// Restrict to upcoming matches whose date is still in the future.
    #[serde(default)]
    pub upcoming: bool,
    /// Restrict to matches with at least one seat left.
    #[serde(default)]
    pub available: bool,
    #[serde(rename = "sortBy", default)]
    pub sort_by: MatchSort,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_page")]
    pub page: i64,
}

impl Default for MatchFilter {
    fn default() -> Self {
        Self {
            status: None,
            upcoming: false,
            available: false,
            sort_by: MatchSort::default(),
            order: SortOrder::default(),
            limit: default_limit(),
            page: default_page(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    /// Restrict to tickets whose match date is still in the future.
    #[serde(default)]
    pub upcoming: bool,
    #[serde(rename = "sortBy", default)]
    pub sort_by: TicketSort,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_page")]
    pub page: i64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self {
            status: None,
            upcoming: false,
            sort_by: TicketSort::default(),
            order: SortOrder::default(),
            limit: default_limit(),
            page: default_page(),
        }
    }
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// The ledger's public surface. Thin by design: the four ticket operations
/// delegate their atomic section to the storage port and contribute the
/// parts that need no lock (identity, pricing, transition targets).
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn InventoryStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Buy one seat on a match. Atomically decrements `available_seats`,
    /// allocates a seat label and inserts the `pending` ticket; on any
    /// failure nothing is written.
    pub async fn purchase(
        &self,
        user_id: Uuid,
        match_uuid: Uuid,
        category: TicketCategory,
    ) -> Result<Ticket, LedgerError> {
        let draft = TicketDraft::new(user_id, category);
        let ticket = self.store.reserve_seat(match_uuid, draft).await?;
        tracing::info!(
            ticket = %ticket.uuid,
            r#match = %match_uuid,
            user = %user_id,
            category = ?category,
            "ticket purchased"
        );
        Ok(ticket)
    }

    /// Move a pending ticket to `active`. The seat was consumed at purchase,
    /// so the counters are untouched.
    pub async fn confirm(&self, user_id: Uuid, ticket_uuid: Uuid) -> Result<Ticket, LedgerError> {
        self.store
            .transition_ticket(ticket_uuid, user_id, TicketStatus::Active)
            .await
    }

    /// Cancel a pending or active ticket, atomically returning its seat to
    /// the match (clamped at `total_seats`).
    pub async fn cancel(&self, user_id: Uuid, ticket_uuid: Uuid) -> Result<Ticket, LedgerError> {
        let ticket = self.store.release_seat(ticket_uuid, user_id).await?;
        tracing::info!(ticket = %ticket.uuid, r#match = %ticket.match_uuid, "ticket cancelled");
        Ok(ticket)
    }

    /// Edit a pending ticket's seat label or category. A category change
    /// reprices the ticket from the fixed table. No seat-count effect.
    pub async fn update_ticket(
        &self,
        user_id: Uuid,
        ticket_uuid: Uuid,
        update: TicketUpdate,
    ) -> Result<Ticket, LedgerError> {
        let patch = TicketPatch {
            seat_number: update.seat_number,
            price: update.category.map(price_of),
            category: update.category,
        };
        self.store
            .update_pending_ticket(ticket_uuid, user_id, patch)
            .await
    }

    pub async fn list_tickets(
        &self,
        user_id: Uuid,
        filter: &TicketFilter,
    ) -> Result<Vec<Ticket>, LedgerError> {
        self.store.list_tickets(user_id, filter).await
    }

    pub async fn get_ticket(&self, user_id: Uuid, ticket_uuid: Uuid) -> Result<Ticket, LedgerError> {
        self.store
            .find_ticket(ticket_uuid, user_id)
            .await?
            .ok_or(LedgerError::NotFound("Ticket"))
    }

    /// Create a match with a full seat pool: `available_seats` starts at
    /// `total_seats` and only ticket operations move it afterwards.
    pub async fn create_match(&self, new: NewMatch) -> Result<FootballMatch, LedgerError> {
        let m = self.store.create_match(new).await?;
        tracing::info!(r#match = %m.uuid, seats = m.total_seats, "match created");
        Ok(m)
    }

    pub async fn list_matches(
        &self,
        filter: &MatchFilter,
    ) -> Result<Vec<FootballMatch>, LedgerError> {
        self.store.list_matches(filter).await
    }

    pub async fn get_match(&self, match_uuid: Uuid) -> Result<FootballMatch, LedgerError> {
        self.store
            .find_match(match_uuid)
            .await?
            .ok_or(LedgerError::NotFound("Match"))
    }

    pub async fn update_match(
        &self,
        match_uuid: Uuid,
        patch: MatchPatch,
    ) -> Result<FootballMatch, LedgerError> {
        self.store.update_match(match_uuid, patch).await
    }

    /// Delete a match. Refused while any ticket on it is pending or active.
    pub async fn delete_match(&self, match_uuid: Uuid) -> Result<(), LedgerError> {
        self.store.delete_match(match_uuid).await?;
        tracing::info!(r#match = %match_uuid, "match deleted");
        Ok(())
    }

    pub async fn match_tickets(&self, match_uuid: Uuid) -> Result<Vec<Ticket>, LedgerError> {
        self.store.match_tickets(match_uuid).await
    }
}

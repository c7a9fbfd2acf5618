//! Storage port for the inventory ledger.
//!
//! The ledger never talks to a database directly; it consumes this trait.
//! The two seat-moving primitives, [`InventoryStore::reserve_seat`] and
//! [`InventoryStore::release_seat`], carry the atomicity contract: each one
//! executes as a single atomic unit against the match row, so concurrent
//! purchases cannot oversell and a purchase/cancel race cannot break the
//! seat invariant. Operations on different matches never serialize against
//! each other.

use async_trait::async_trait;
use uuid::Uuid;

use crate::ledger::{
    LedgerError, MatchFilter, MatchPatch, NewMatch, TicketDraft, TicketFilter, TicketPatch,
};
use crate::models::{FootballMatch, Ticket, TicketStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert a match with `available_seats = total_seats` and an empty
    /// seat sequence.
    async fn create_match(&self, new: NewMatch) -> Result<FootballMatch, LedgerError>;

    async fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<FootballMatch>, LedgerError>;

    async fn find_match(&self, match_uuid: Uuid) -> Result<Option<FootballMatch>, LedgerError>;

    /// Apply an administrative edit. A `total_seats` change recomputes
    /// `available_seats` via [`crate::ledger::rebalance_available`] inside
    /// the same critical section as seat-moving operations.
    async fn update_match(
        &self,
        match_uuid: Uuid,
        patch: MatchPatch,
    ) -> Result<FootballMatch, LedgerError>;

    /// Delete a match and its ticket history. Refused with `InvalidState`
    /// while any ticket on the match is pending or active.
    async fn delete_match(&self, match_uuid: Uuid) -> Result<(), LedgerError>;

    async fn match_tickets(&self, match_uuid: Uuid) -> Result<Vec<Ticket>, LedgerError>;

    async fn list_tickets(
        &self,
        owner: Uuid,
        filter: &TicketFilter,
    ) -> Result<Vec<Ticket>, LedgerError>;

    /// Owner-scoped lookup: a ticket belonging to someone else is `None`,
    /// indistinguishable from a missing one.
    async fn find_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
    ) -> Result<Option<Ticket>, LedgerError>;

    /// Atomically take one seat from the match and insert the resulting
    /// pending ticket. Fails with `NotFound` / `InvalidState` /
    /// `SeatsExhausted` per the ledger rules; no partial effect on any
    /// failure path.
    async fn reserve_seat(
        &self,
        match_uuid: Uuid,
        draft: TicketDraft,
    ) -> Result<Ticket, LedgerError>;

    /// Atomically cancel the ticket and return its seat to the match,
    /// clamped so `available_seats` never exceeds `total_seats`.
    async fn release_seat(&self, ticket_uuid: Uuid, owner: Uuid) -> Result<Ticket, LedgerError>;

    /// Move a ticket into `to` if the ledger's transition table allows it
    /// from the current status. Never touches seat counters.
    async fn transition_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
        to: TicketStatus,
    ) -> Result<Ticket, LedgerError>;

    /// Apply a seat-label/category/price patch to a pending ticket.
    async fn update_pending_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
        patch: TicketPatch,
    ) -> Result<Ticket, LedgerError>;
}

/// Limit and zero-based offset for a page request, clamped through
/// [`crate::ledger::clamp_page`] so stores and response envelopes agree on
/// the window.
pub(crate) fn page_window(limit: i64, page: i64) -> (i64, i64) {
    let (limit, page) = crate::ledger::clamp_page(limit, page);
    (limit, (page - 1) * limit)
}

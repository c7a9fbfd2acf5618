//! In-memory inventory store.
//!
//! Backs the test suite and local demos. Mirrors the relational backend's
//! locking shape: every match lives behind its own mutex, so seat-moving
//! operations on one match serialize against each other while different
//! matches proceed independently.
//!
//! Lock order is fixed: matches map, then the match slot, then the tickets
//! map. `create`/`delete` take the map exclusively; everything else shares
//! it for the duration of the slot critical section.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::ledger::{
    self, LedgerError, MatchFilter, MatchPatch, MatchSort, NewMatch, SortOrder, TicketDraft,
    TicketFilter, TicketPatch, TicketSort,
};
use crate::models::{FootballMatch, MatchStatus, Ticket, TicketStatus};
use crate::store::{page_window, InventoryStore};

type Slot = Arc<Mutex<FootballMatch>>;

#[derive(Default)]
pub struct MemoryStore {
    matches: RwLock<HashMap<Uuid, Slot>>,
    tickets: RwLock<HashMap<Uuid, Ticket>>,
    match_seq: AtomicI64,
    ticket_seq: AtomicI64,
}

// A poisoned lock only means a test thread panicked mid-operation; the data
// is still the best snapshot we have.
fn lock(slot: &Mutex<FootballMatch>) -> MutexGuard<'_, FootballMatch> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(map: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    map.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(map: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    map.write().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_match_id(&self) -> i64 {
        self.match_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn next_ticket_id(&self) -> i64 {
        self.ticket_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn sort_matches(items: &mut [FootballMatch], sort_by: MatchSort, order: SortOrder) {
    items.sort_by(|a, b| {
        let ord = match sort_by {
            MatchSort::MatchDate => a.match_date.cmp(&b.match_date),
            MatchSort::Title => a.title.cmp(&b.title),
            MatchSort::CreatedAt => a.created_at.cmp(&b.created_at),
            MatchSort::AvailableSeats => a.available_seats.cmp(&b.available_seats),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

fn sort_tickets(items: &mut [Ticket], sort_by: TicketSort, order: SortOrder) {
    items.sort_by(|a, b| {
        let ord = match sort_by {
            TicketSort::MatchDate => a.match_date.cmp(&b.match_date),
            TicketSort::CreatedAt => a.created_at.cmp(&b.created_at),
            TicketSort::Price => a.price.cmp(&b.price),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn create_match(&self, new: NewMatch) -> Result<FootballMatch, LedgerError> {
        let now = Utc::now();
        let m = FootballMatch {
            id: self.next_match_id(),
            uuid: Uuid::new_v4(),
            title: new.title,
            match_date: new.match_date,
            venue: new.venue,
            competition: new.competition,
            home_team: new.home_team,
            away_team: new.away_team,
            home_team_logo: new.home_team_logo,
            away_team_logo: new.away_team_logo,
            total_seats: new.total_seats,
            available_seats: new.total_seats,
            seat_sequence: 0,
            status: MatchStatus::Upcoming,
            created_at: now,
            updated_at: now,
        };
        write(&self.matches).insert(m.uuid, Arc::new(Mutex::new(m.clone())));
        Ok(m)
    }

    async fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<FootballMatch>, LedgerError> {
        let now = Utc::now();
        let mut items: Vec<FootballMatch> = {
            let map = read(&self.matches);
            map.values().map(|slot| lock(slot).clone()).collect()
        };

        items.retain(|m| {
            filter.status.map_or(true, |s| m.status == s)
                && (!filter.upcoming || (m.status == MatchStatus::Upcoming && m.match_date > now))
                && (!filter.available || m.available_seats > 0)
        });
        sort_matches(&mut items, filter.sort_by, filter.order);

        let (limit, offset) = page_window(filter.limit, filter.page);
        Ok(items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_match(&self, match_uuid: Uuid) -> Result<Option<FootballMatch>, LedgerError> {
        let map = read(&self.matches);
        Ok(map.get(&match_uuid).map(|slot| lock(slot).clone()))
    }

    async fn update_match(
        &self,
        match_uuid: Uuid,
        patch: MatchPatch,
    ) -> Result<FootballMatch, LedgerError> {
        let map = read(&self.matches);
        let slot = map.get(&match_uuid).ok_or(LedgerError::NotFound("Match"))?;
        let mut m = lock(slot);

        if let Some(title) = patch.title {
            m.title = title;
        }
        if let Some(date) = patch.match_date {
            m.match_date = date;
        }
        if let Some(venue) = patch.venue {
            m.venue = venue;
        }
        if let Some(competition) = patch.competition {
            m.competition = competition;
        }
        if let Some(home) = patch.home_team {
            m.home_team = home;
        }
        if let Some(away) = patch.away_team {
            m.away_team = away;
        }
        if let Some(logo) = patch.home_team_logo {
            m.home_team_logo = Some(logo);
        }
        if let Some(logo) = patch.away_team_logo {
            m.away_team_logo = Some(logo);
        }
        if let Some(status) = patch.status {
            m.status = status;
        }
        if let Some(new_total) = patch.total_seats {
            if new_total != m.total_seats {
                let rebalanced = ledger::rebalance_available(&m, new_total);
                m.available_seats = rebalanced;
                m.total_seats = new_total;
            }
        }
        m.updated_at = Utc::now();

        Ok(m.clone())
    }

    async fn delete_match(&self, match_uuid: Uuid) -> Result<(), LedgerError> {
        let mut map = write(&self.matches);
        let slot = map.get(&match_uuid).ok_or(LedgerError::NotFound("Match"))?;
        let match_id = {
            let m = lock(slot);
            let tickets = read(&self.tickets);
            let live = tickets
                .values()
                .any(|t| t.match_id == m.id && ledger::cancellable(t.status));
            if live {
                return Err(LedgerError::InvalidState(
                    "cannot delete a match with pending or active tickets",
                ));
            }
            m.id
        };
        map.remove(&match_uuid);
        // cascade: drop the (cancelled/expired) ticket history with the match
        write(&self.tickets).retain(|_, t| t.match_id != match_id);
        Ok(())
    }

    async fn match_tickets(&self, match_uuid: Uuid) -> Result<Vec<Ticket>, LedgerError> {
        let match_id = {
            let map = read(&self.matches);
            let slot = map.get(&match_uuid).ok_or(LedgerError::NotFound("Match"))?;
            let id = lock(slot).id;
            id
        };
        let tickets = read(&self.tickets);
        let mut items: Vec<Ticket> = tickets
            .values()
            .filter(|t| t.match_id == match_id)
            .cloned()
            .collect();
        items.sort_by_key(|t| t.created_at);
        Ok(items)
    }

    async fn list_tickets(
        &self,
        owner: Uuid,
        filter: &TicketFilter,
    ) -> Result<Vec<Ticket>, LedgerError> {
        let now = Utc::now();
        let mut items: Vec<Ticket> = {
            let tickets = read(&self.tickets);
            tickets
                .values()
                .filter(|t| t.user_id == owner)
                .filter(|t| filter.status.map_or(true, |s| t.status == s))
                .filter(|t| !filter.upcoming || t.match_date > now)
                .cloned()
                .collect()
        };
        sort_tickets(&mut items, filter.sort_by, filter.order);

        let (limit, offset) = page_window(filter.limit, filter.page);
        Ok(items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
    ) -> Result<Option<Ticket>, LedgerError> {
        let tickets = read(&self.tickets);
        Ok(tickets
            .get(&ticket_uuid)
            .filter(|t| t.user_id == owner)
            .cloned())
    }

    async fn reserve_seat(
        &self,
        match_uuid: Uuid,
        draft: TicketDraft,
    ) -> Result<Ticket, LedgerError> {
        let map = read(&self.matches);
        let slot = map.get(&match_uuid).ok_or(LedgerError::NotFound("Match"))?;
        let mut m = lock(slot);

        ledger::check_purchasable(&m)?;
        let row = ledger::draft_ticket(&m, &draft);

        let now = Utc::now();
        m.available_seats -= 1;
        m.seat_sequence += 1;
        m.updated_at = now;

        let ticket = Ticket {
            id: self.next_ticket_id(),
            uuid: row.uuid,
            user_id: row.user_id,
            match_id: row.match_id,
            match_uuid: row.match_uuid,
            match_title: row.match_title,
            match_date: row.match_date,
            seat_number: row.seat_number,
            category: row.category,
            price: row.price,
            status: row.status,
            created_at: now,
            updated_at: now,
        };
        write(&self.tickets).insert(ticket.uuid, ticket.clone());
        Ok(ticket)
    }

    async fn release_seat(&self, ticket_uuid: Uuid, owner: Uuid) -> Result<Ticket, LedgerError> {
        let match_uuid = {
            let tickets = read(&self.tickets);
            tickets
                .get(&ticket_uuid)
                .filter(|t| t.user_id == owner)
                .map(|t| t.match_uuid)
                .ok_or(LedgerError::NotFound("Ticket"))?
        };

        let map = read(&self.matches);
        let slot = map.get(&match_uuid).ok_or_else(|| {
            LedgerError::Storage("ticket references a missing match".to_string())
        })?;
        let mut m = lock(slot);

        // status re-checked under the slot lock so racing cancels cannot
        // both return the seat
        let mut tickets = write(&self.tickets);
        let ticket = tickets
            .get_mut(&ticket_uuid)
            .filter(|t| t.user_id == owner)
            .ok_or(LedgerError::NotFound("Ticket"))?;
        if !ledger::cancellable(ticket.status) {
            return Err(ledger::invalid_transition(TicketStatus::Cancelled));
        }

        let now = Utc::now();
        ticket.status = TicketStatus::Cancelled;
        ticket.updated_at = now;

        let returned = ledger::seat_return(&m);
        m.available_seats += returned;
        m.updated_at = now;

        Ok(ticket.clone())
    }

    async fn transition_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
        to: TicketStatus,
    ) -> Result<Ticket, LedgerError> {
        let mut tickets = write(&self.tickets);
        let ticket = tickets
            .get_mut(&ticket_uuid)
            .filter(|t| t.user_id == owner)
            .ok_or(LedgerError::NotFound("Ticket"))?;
        if !ledger::transition_allowed(ticket.status, to) {
            return Err(ledger::invalid_transition(to));
        }
        ticket.status = to;
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }

    async fn update_pending_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
        patch: TicketPatch,
    ) -> Result<Ticket, LedgerError> {
        let mut tickets = write(&self.tickets);
        let ticket = tickets
            .get_mut(&ticket_uuid)
            .filter(|t| t.user_id == owner)
            .ok_or(LedgerError::NotFound("Ticket"))?;
        ledger::check_updatable(ticket.status)?;

        if let Some(seat) = patch.seat_number {
            ticket.seat_number = seat;
        }
        if let Some(category) = patch.category {
            ticket.category = category;
        }
        if let Some(price) = patch.price {
            ticket.price = price;
        }
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }
}

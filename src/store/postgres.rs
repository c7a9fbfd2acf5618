//! Postgres-backed inventory store.
//!
//! Seat-moving operations run inside a transaction that takes a
//! `SELECT ... FOR UPDATE` row lock on the match, so the seat counter and
//! the ticket row always move together. Row locks keep matches independent
//! of each other; the lock is held only for the single read-modify-write.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ledger::{
    self, LedgerError, MatchFilter, MatchPatch, NewMatch, TicketDraft, TicketFilter, TicketPatch,
};
use crate::models::{FootballMatch, MatchStatus, Ticket, TicketStatus};
use crate::store::{page_window, InventoryStore};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_sqlx(err: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db) = &err {
        // serialization failure / deadlock: the contended update lost; the
        // caller decides whether to retry
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return LedgerError::ConcurrencyConflict;
        }
        // seat-bound check constraint tripped by a concurrent writer
        if db.code().as_deref() == Some("23514") {
            return LedgerError::ConcurrencyConflict;
        }
    }
    LedgerError::Storage(err.to_string())
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn create_match(&self, new: NewMatch) -> Result<FootballMatch, LedgerError> {
        sqlx::query_as(
            "INSERT INTO matches (uuid, title, match_date, venue, competition, home_team, \
             away_team, home_team_logo, away_team_logo, total_seats, available_seats, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $11) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new.title)
        .bind(new.match_date)
        .bind(new.venue)
        .bind(new.competition)
        .bind(new.home_team)
        .bind(new.away_team)
        .bind(new.home_team_logo)
        .bind(new.away_team_logo)
        .bind(new.total_seats)
        .bind(MatchStatus::Upcoming)
        .fetch_one(&self.pool)
        .await
        .map_err(from_sqlx)
    }

    async fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<FootballMatch>, LedgerError> {
        let (limit, offset) = page_window(filter.limit, filter.page);
        let sql = format!(
            "SELECT * FROM matches \
             WHERE ($1::text IS NULL OR status = $1) \
               AND (NOT $2 OR (status = 'upcoming' AND match_date > NOW())) \
               AND (NOT $3 OR available_seats > 0) \
             ORDER BY {} {} \
             LIMIT $4 OFFSET $5",
            filter.sort_by.column(),
            filter.order.sql(),
        );
        sqlx::query_as(&sql)
            .bind(filter.status)
            .bind(filter.upcoming)
            .bind(filter.available)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(from_sqlx)
    }

    async fn find_match(&self, match_uuid: Uuid) -> Result<Option<FootballMatch>, LedgerError> {
        sqlx::query_as("SELECT * FROM matches WHERE uuid = $1")
            .bind(match_uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx)
    }

    async fn update_match(
        &self,
        match_uuid: Uuid,
        patch: MatchPatch,
    ) -> Result<FootballMatch, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(from_sqlx)?;

        let m: FootballMatch = sqlx::query_as("SELECT * FROM matches WHERE uuid = $1 FOR UPDATE")
            .bind(match_uuid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(from_sqlx)?
            .ok_or(LedgerError::NotFound("Match"))?;

        let (total_seats, available_seats) = match patch.total_seats {
            Some(new_total) if new_total != m.total_seats => {
                (new_total, ledger::rebalance_available(&m, new_total))
            }
            _ => (m.total_seats, m.available_seats),
        };

        let updated: FootballMatch = sqlx::query_as(
            "UPDATE matches SET title = $2, match_date = $3, venue = $4, competition = $5, \
             home_team = $6, away_team = $7, home_team_logo = $8, away_team_logo = $9, \
             total_seats = $10, available_seats = $11, status = $12, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(m.id)
        .bind(patch.title.unwrap_or(m.title))
        .bind(patch.match_date.unwrap_or(m.match_date))
        .bind(patch.venue.unwrap_or(m.venue))
        .bind(patch.competition.unwrap_or(m.competition))
        .bind(patch.home_team.unwrap_or(m.home_team))
        .bind(patch.away_team.unwrap_or(m.away_team))
        .bind(patch.home_team_logo.or(m.home_team_logo))
        .bind(patch.away_team_logo.or(m.away_team_logo))
        .bind(total_seats)
        .bind(available_seats)
        .bind(patch.status.unwrap_or(m.status))
        .fetch_one(&mut *tx)
        .await
        .map_err(from_sqlx)?;

        tx.commit().await.map_err(from_sqlx)?;
        Ok(updated)
    }

    async fn delete_match(&self, match_uuid: Uuid) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await.map_err(from_sqlx)?;

        let m: FootballMatch = sqlx::query_as("SELECT * FROM matches WHERE uuid = $1 FOR UPDATE")
            .bind(match_uuid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(from_sqlx)?
            .ok_or(LedgerError::NotFound("Match"))?;

        let (live,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tickets \
             WHERE match_id = $1 AND status IN ('pending', 'active')",
        )
        .bind(m.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(from_sqlx)?;
        if live > 0 {
            return Err(LedgerError::InvalidState(
                "cannot delete a match with pending or active tickets",
            ));
        }

        // ticket history goes with the match (ON DELETE CASCADE)
        sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(m.id)
            .execute(&mut *tx)
            .await
            .map_err(from_sqlx)?;

        tx.commit().await.map_err(from_sqlx)?;
        Ok(())
    }

    async fn match_tickets(&self, match_uuid: Uuid) -> Result<Vec<Ticket>, LedgerError> {
        let m: FootballMatch = sqlx::query_as("SELECT * FROM matches WHERE uuid = $1")
            .bind(match_uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx)?
            .ok_or(LedgerError::NotFound("Match"))?;

        sqlx::query_as("SELECT * FROM tickets WHERE match_id = $1 ORDER BY created_at")
            .bind(m.id)
            .fetch_all(&self.pool)
            .await
            .map_err(from_sqlx)
    }

    async fn list_tickets(
        &self,
        owner: Uuid,
        filter: &TicketFilter,
    ) -> Result<Vec<Ticket>, LedgerError> {
        let (limit, offset) = page_window(filter.limit, filter.page);
        let sql = format!(
            "SELECT * FROM tickets \
             WHERE user_id = $1 \
               AND ($2::text IS NULL OR status = $2) \
               AND (NOT $3 OR match_date > NOW()) \
             ORDER BY {} {} \
             LIMIT $4 OFFSET $5",
            filter.sort_by.column(),
            filter.order.sql(),
        );
        sqlx::query_as(&sql)
            .bind(owner)
            .bind(filter.status)
            .bind(filter.upcoming)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(from_sqlx)
    }

    async fn find_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
    ) -> Result<Option<Ticket>, LedgerError> {
        sqlx::query_as("SELECT * FROM tickets WHERE uuid = $1 AND user_id = $2")
            .bind(ticket_uuid)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx)
    }

    async fn reserve_seat(
        &self,
        match_uuid: Uuid,
        draft: TicketDraft,
    ) -> Result<Ticket, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(from_sqlx)?;

        let m: FootballMatch = sqlx::query_as("SELECT * FROM matches WHERE uuid = $1 FOR UPDATE")
            .bind(match_uuid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(from_sqlx)?
            .ok_or(LedgerError::NotFound("Match"))?;

        // dropping the tx on any failure below rolls the lock back with it
        ledger::check_purchasable(&m)?;
        let row = ledger::draft_ticket(&m, &draft);

        sqlx::query(
            "UPDATE matches SET available_seats = available_seats - 1, \
             seat_sequence = seat_sequence + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(m.id)
        .execute(&mut *tx)
        .await
        .map_err(from_sqlx)?;

        let ticket: Ticket = sqlx::query_as(
            "INSERT INTO tickets (uuid, user_id, match_id, match_uuid, match_title, \
             match_date, seat_number, category, price, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING *",
        )
        .bind(row.uuid)
        .bind(row.user_id)
        .bind(row.match_id)
        .bind(row.match_uuid)
        .bind(row.match_title)
        .bind(row.match_date)
        .bind(row.seat_number)
        .bind(row.category)
        .bind(row.price)
        .bind(row.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(from_sqlx)?;

        tx.commit().await.map_err(from_sqlx)?;
        Ok(ticket)
    }

    async fn release_seat(&self, ticket_uuid: Uuid, owner: Uuid) -> Result<Ticket, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(from_sqlx)?;

        let t: Ticket =
            sqlx::query_as("SELECT * FROM tickets WHERE uuid = $1 AND user_id = $2 FOR UPDATE")
                .bind(ticket_uuid)
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await
                .map_err(from_sqlx)?
                .ok_or(LedgerError::NotFound("Ticket"))?;
        if !ledger::cancellable(t.status) {
            return Err(ledger::invalid_transition(TicketStatus::Cancelled));
        }

        // a live ticket pins its match (delete is refused), so the row exists
        let m: FootballMatch = sqlx::query_as("SELECT * FROM matches WHERE id = $1 FOR UPDATE")
            .bind(t.match_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(from_sqlx)?
            .ok_or_else(|| LedgerError::Storage("ticket references a missing match".to_string()))?;

        sqlx::query(
            "UPDATE matches SET available_seats = available_seats + $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(m.id)
        .bind(ledger::seat_return(&m))
        .execute(&mut *tx)
        .await
        .map_err(from_sqlx)?;

        let cancelled: Ticket = sqlx::query_as(
            "UPDATE tickets SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(t.id)
        .bind(TicketStatus::Cancelled)
        .fetch_one(&mut *tx)
        .await
        .map_err(from_sqlx)?;

        tx.commit().await.map_err(from_sqlx)?;
        Ok(cancelled)
    }

    async fn transition_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
        to: TicketStatus,
    ) -> Result<Ticket, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(from_sqlx)?;

        let t: Ticket =
            sqlx::query_as("SELECT * FROM tickets WHERE uuid = $1 AND user_id = $2 FOR UPDATE")
                .bind(ticket_uuid)
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await
                .map_err(from_sqlx)?
                .ok_or(LedgerError::NotFound("Ticket"))?;
        if !ledger::transition_allowed(t.status, to) {
            return Err(ledger::invalid_transition(to));
        }

        let updated: Ticket = sqlx::query_as(
            "UPDATE tickets SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(t.id)
        .bind(to)
        .fetch_one(&mut *tx)
        .await
        .map_err(from_sqlx)?;

        tx.commit().await.map_err(from_sqlx)?;
        Ok(updated)
    }

    async fn update_pending_ticket(
        &self,
        ticket_uuid: Uuid,
        owner: Uuid,
        patch: TicketPatch,
    ) -> Result<Ticket, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(from_sqlx)?;

        let t: Ticket =
            sqlx::query_as("SELECT * FROM tickets WHERE uuid = $1 AND user_id = $2 FOR UPDATE")
                .bind(ticket_uuid)
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await
                .map_err(from_sqlx)?
                .ok_or(LedgerError::NotFound("Ticket"))?;
        ledger::check_updatable(t.status)?;

        let updated: Ticket = sqlx::query_as(
            "UPDATE tickets SET seat_number = COALESCE($2, seat_number), \
             category = COALESCE($3, category), price = COALESCE($4, price), \
             updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(t.id)
        .bind(patch.seat_number)
        .bind(patch.category)
        .bind(patch.price)
        .fetch_one(&mut *tx)
        .await
        .map_err(from_sqlx)?;

        tx.commit().await.map_err(from_sqlx)?;
        Ok(updated)
    }
}

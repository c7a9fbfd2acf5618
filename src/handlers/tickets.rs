use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::ledger::{TicketFilter, TicketUpdate};
use crate::models::TicketCategory;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::identity::Caller;
use crate::utils::response::{created, empty_success, paged, success};

const MAX_SEAT_LABEL_LEN: usize = 50;

#[derive(Deserialize)]
pub struct PurchasePayload {
    pub match_uuid: Uuid,
    pub category: TicketCategory,
}

pub async fn purchase(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Json(payload): Json<PurchasePayload>,
) -> Result<Response, AppError> {
    let ticket = state
        .ledger
        .purchase(user_id, payload.match_uuid, payload.category)
        .await?;
    Ok(created(ticket, "Ticket purchased successfully"))
}

pub async fn list(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Query(filter): Query<TicketFilter>,
) -> Result<Response, AppError> {
    let items = state.ledger.list_tickets(user_id, &filter).await?;
    Ok(paged(items, filter.page, filter.limit, "Tickets retrieved"))
}

pub async fn show(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(uuid): Path<Uuid>,
) -> Result<Response, AppError> {
    let ticket = state.ledger.get_ticket(user_id, uuid).await?;
    Ok(success(ticket, "Ticket retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(uuid): Path<Uuid>,
    Json(payload): Json<TicketUpdate>,
) -> Result<Response, AppError> {
    if let Some(seat) = payload.seat_number.as_deref() {
        if seat.trim().is_empty() || seat.len() > MAX_SEAT_LABEL_LEN {
            return Err(AppError::ValidationError(format!(
                "seat_number must be 1 to {MAX_SEAT_LABEL_LEN} characters"
            )));
        }
    }

    let ticket = state.ledger.update_ticket(user_id, uuid, payload).await?;
    Ok(success(ticket, "Ticket updated successfully"))
}

pub async fn cancel(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(uuid): Path<Uuid>,
) -> Result<Response, AppError> {
    state.ledger.cancel(user_id, uuid).await?;
    Ok(empty_success("Ticket cancelled successfully"))
}

pub async fn confirm(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    Path(uuid): Path<Uuid>,
) -> Result<Response, AppError> {
    let ticket = state.ledger.confirm(user_id, uuid).await?;
    Ok(success(ticket, "Ticket confirmed successfully"))
}

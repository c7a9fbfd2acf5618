use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::ledger::{MatchFilter, MatchPatch, NewMatch};
use crate::models::{FootballMatch, MatchStatus};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, paged, success};

const DEFAULT_VENUE: &str = "Camp Nou";
const DEFAULT_SEATS: i32 = 100;
const MAX_SEATS: i32 = 100_000;

#[derive(Deserialize)]
pub struct CreateMatchPayload {
    pub title: String,
    pub match_date: DateTime<Utc>,
    pub venue: Option<String>,
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub home_team_logo: Option<String>,
    pub away_team_logo: Option<String>,
    pub total_seats: Option<i32>,
}

#[derive(Deserialize, Default)]
pub struct UpdateMatchPayload {
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

/// Match plus the derived sales figures the dashboard renders.
#[derive(Serialize)]
struct MatchWithStats {
    #[serde(flatten)]
    inner: FootballMatch,
    tickets_sold: i32,
    tickets_percentage: f64,
}

impl MatchWithStats {
    fn from_match(m: FootballMatch) -> Self {
        let sold = m.tickets_sold();
        let percentage = if m.total_seats > 0 {
            (f64::from(sold) / f64::from(m.total_seats) * 1000.0).round() / 10.0
        } else {
            0.0
        };
        Self {
            inner: m,
            tickets_sold: sold,
            tickets_percentage: percentage,
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

fn check_seat_count(total_seats: i32) -> Result<(), AppError> {
    if !(1..=MAX_SEATS).contains(&total_seats) {
        return Err(AppError::ValidationError(format!(
            "total_seats must be between 1 and {MAX_SEATS}"
        )));
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateMatchPayload>,
) -> Result<Response, AppError> {
    require("title", &payload.title)?;
    require("competition", &payload.competition)?;
    require("home_team", &payload.home_team)?;
    require("away_team", &payload.away_team)?;
    if payload.match_date <= Utc::now() {
        return Err(AppError::ValidationError(
            "match_date must be in the future".to_string(),
        ));
    }
    let total_seats = payload.total_seats.unwrap_or(DEFAULT_SEATS);
    check_seat_count(total_seats)?;

    let m = state
        .ledger
        .create_match(NewMatch {
            title: payload.title,
            match_date: payload.match_date,
            venue: payload.venue.unwrap_or_else(|| DEFAULT_VENUE.to_string()),
            competition: payload.competition,
            home_team: payload.home_team,
            away_team: payload.away_team,
            home_team_logo: payload.home_team_logo,
            away_team_logo: payload.away_team_logo,
            total_seats,
        })
        .await?;

    Ok(created(m, "Match created successfully"))
}

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<MatchFilter>,
) -> Result<Response, AppError> {
    let items = state.ledger.list_matches(&filter).await?;
    Ok(paged(items, filter.page, filter.limit, "Matches retrieved"))
}

pub async fn show(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Response, AppError> {
    let m = state.ledger.get_match(uuid).await?;
    Ok(success(MatchWithStats::from_match(m), "Match retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(payload): Json<UpdateMatchPayload>,
) -> Result<Response, AppError> {
    if let Some(total_seats) = payload.total_seats {
        check_seat_count(total_seats)?;
    }

    let m = state
        .ledger
        .update_match(
            uuid,
            MatchPatch {
                title: payload.title,
                match_date: payload.match_date,
                venue: payload.venue,
                competition: payload.competition,
                home_team: payload.home_team,
                away_team: payload.away_team,
                home_team_logo: payload.home_team_logo,
                away_team_logo: payload.away_team_logo,
                total_seats: payload.total_seats,
                status: payload.status,
            },
        )
        .await?;

    Ok(success(m, "Match updated successfully"))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Response, AppError> {
    state.ledger.delete_match(uuid).await?;
    Ok(empty_success("Match deleted successfully"))
}

pub async fn tickets(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Response, AppError> {
    let m = state.ledger.get_match(uuid).await?;
    let tickets = state.ledger.match_tickets(uuid).await?;
    Ok(success(
        json!({ "match": m, "tickets": tickets }),
        "Match tickets retrieved",
    ))
}

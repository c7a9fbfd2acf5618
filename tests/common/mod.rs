use std::sync::Arc;

use chrono::{Duration, Utc};
use matchday_server::ledger::{Ledger, NewMatch};
use matchday_server::models::FootballMatch;
use matchday_server::store::MemoryStore;

pub fn ledger() -> Ledger {
    Ledger::new(Arc::new(MemoryStore::new()))
}

pub async fn seed_match(ledger: &Ledger, total_seats: i32) -> FootballMatch {
    ledger
        .create_match(NewMatch {
            title: "Barcelona vs Real Madrid".to_string(),
            match_date: Utc::now() + Duration::days(30),
            venue: "Camp Nou".to_string(),
            competition: "La Liga".to_string(),
            home_team: "Barcelona".to_string(),
            away_team: "Real Madrid".to_string(),
            home_team_logo: None,
            away_team_logo: None,
            total_seats,
        })
        .await
        .expect("seed match")
}

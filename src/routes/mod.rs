use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer};
use crate::handlers::{health_check, matches, tickets};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/matches", get(matches::list).post(matches::create))
        .route(
            "/matches/:uuid",
            get(matches::show)
                .put(matches::update)
                .delete(matches::destroy),
        )
        .route("/matches/:uuid/tickets", get(matches::tickets))
        .route("/tickets", get(tickets::list).post(tickets::purchase))
        .route(
            "/tickets/:uuid",
            get(tickets::show)
                .put(tickets::update)
                .delete(tickets::cancel),
        )
        .route("/tickets/:uuid/confirm", post(tickets::confirm));

    apply_security_headers(router)
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer())
        .with_state(state)
}

pub mod config;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

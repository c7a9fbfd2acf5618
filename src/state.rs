use crate::ledger::Ledger;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
}

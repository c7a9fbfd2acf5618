pub mod matches;
pub mod ticket;

pub use matches::{FootballMatch, MatchStatus};
pub use ticket::{Ticket, TicketCategory, TicketStatus};

//! Ledger behavior against the in-memory store: the ticket state machine,
//! the seat counters, and the failure taxonomy.

mod common;

use common::{ledger, seed_match};
use matchday_server::ledger::{LedgerError, MatchPatch, TicketFilter, TicketUpdate};
use matchday_server::models::{TicketCategory, TicketStatus};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::test]
async fn purchase_consumes_a_seat_and_issues_a_pending_ticket() {
    let ledger = ledger();
    let m = seed_match(&ledger, 1).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Vip)
        .await
        .expect("purchase");

    assert_eq!(ticket.status, TicketStatus::Pending);
    assert_eq!(ticket.price, Decimal::from(2_500_000));
    assert_eq!(ticket.match_uuid, m.uuid);
    assert_eq!(ticket.match_title, m.title);
    assert_eq!(ticket.match_date, m.match_date);
    assert!(ticket.seat_number.starts_with('V'));

    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 0);
}

#[tokio::test]
async fn sold_out_match_rejects_further_purchases() {
    let ledger = ledger();
    let m = seed_match(&ledger, 1).await;
    let user = Uuid::new_v4();

    ledger
        .purchase(user, m.uuid, TicketCategory::Vip)
        .await
        .expect("first purchase");
    let err = ledger
        .purchase(user, m.uuid, TicketCategory::Economy)
        .await
        .expect_err("second purchase must fail");

    assert!(matches!(err, LedgerError::SeatsExhausted));
    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 0);
}

#[tokio::test]
async fn cancel_returns_the_seat() {
    let ledger = ledger();
    let m = seed_match(&ledger, 1).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Vip)
        .await
        .expect("purchase");
    let cancelled = ledger.cancel(user, ticket.uuid).await.expect("cancel");

    assert_eq!(cancelled.status, TicketStatus::Cancelled);
    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 1);
}

#[tokio::test]
async fn purchase_then_cancel_round_trips_the_counter() {
    let ledger = ledger();
    let m = seed_match(&ledger, 40).await;
    let user = Uuid::new_v4();

    let before = ledger.get_match(m.uuid).await.expect("match").available_seats;
    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Regular)
        .await
        .expect("purchase");
    ledger.cancel(user, ticket.uuid).await.expect("cancel");

    let after = ledger.get_match(m.uuid).await.expect("match").available_seats;
    assert_eq!(before, after);
}

#[tokio::test]
async fn confirm_activates_without_touching_seats() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Premium)
        .await
        .expect("purchase");
    let confirmed = ledger.confirm(user, ticket.uuid).await.expect("confirm");

    assert_eq!(confirmed.status, TicketStatus::Active);
    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 9);
}

#[tokio::test]
async fn confirm_rejects_non_pending_tickets() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Premium)
        .await
        .expect("purchase");
    ledger.cancel(user, ticket.uuid).await.expect("cancel");

    let err = ledger
        .confirm(user, ticket.uuid)
        .await
        .expect_err("confirming a cancelled ticket");
    assert!(matches!(err, LedgerError::InvalidState(_)));

    // the failed confirm left the counter alone
    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 10);
}

#[tokio::test]
async fn active_tickets_can_still_be_cancelled() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Economy)
        .await
        .expect("purchase");
    ledger.confirm(user, ticket.uuid).await.expect("confirm");
    ledger.cancel(user, ticket.uuid).await.expect("cancel");

    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 10);
}

#[tokio::test]
async fn cancelling_twice_fails_and_keeps_the_counter() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Regular)
        .await
        .expect("purchase");
    ledger.cancel(user, ticket.uuid).await.expect("first cancel");
    let err = ledger
        .cancel(user, ticket.uuid)
        .await
        .expect_err("second cancel");

    assert!(matches!(err, LedgerError::InvalidState(_)));
    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 10);
}

#[tokio::test]
async fn seat_return_clamps_at_total_after_admin_shrink() {
    let ledger = ledger();
    let m = seed_match(&ledger, 5).await;
    let user = Uuid::new_v4();

    let t1 = ledger
        .purchase(user, m.uuid, TicketCategory::Regular)
        .await
        .expect("t1");
    let t2 = ledger
        .purchase(user, m.uuid, TicketCategory::Regular)
        .await
        .expect("t2");

    // shrink below the sold count: available floors at 0
    let shrunk = ledger
        .update_match(
            m.uuid,
            MatchPatch {
                total_seats: Some(1),
                ..Default::default()
            },
        )
        .await
        .expect("shrink");
    assert_eq!(shrunk.total_seats, 1);
    assert_eq!(shrunk.available_seats, 0);

    // first cancellation brings the counter to total...
    ledger.cancel(user, t1.uuid).await.expect("cancel t1");
    let m1 = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m1.available_seats, 1);

    // ...and the second must clamp instead of exceeding it
    ledger.cancel(user, t2.uuid).await.expect("cancel t2");
    let m2 = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m2.available_seats, 1);
    assert_eq!(m2.total_seats, 1);
}

#[tokio::test]
async fn purchase_fails_cleanly_for_missing_or_closed_matches() {
    let ledger = ledger();
    let user = Uuid::new_v4();

    let err = ledger
        .purchase(user, Uuid::new_v4(), TicketCategory::Vip)
        .await
        .expect_err("unknown match");
    assert!(matches!(err, LedgerError::NotFound("Match")));

    let m = seed_match(&ledger, 10).await;
    ledger
        .update_match(
            m.uuid,
            MatchPatch {
                status: Some(matchday_server::models::MatchStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .expect("complete the match");

    let err = ledger
        .purchase(user, m.uuid, TicketCategory::Vip)
        .await
        .expect_err("completed match");
    assert!(matches!(err, LedgerError::InvalidState(_)));

    // no partial effect on either failure path
    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 10);
    assert!(ledger.match_tickets(m.uuid).await.expect("tickets").is_empty());
}

#[tokio::test]
async fn category_change_reprices_a_pending_ticket() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Economy)
        .await
        .expect("purchase");
    assert_eq!(ticket.price, Decimal::from(350_000));

    let updated = ledger
        .update_ticket(
            user,
            ticket.uuid,
            TicketUpdate {
                category: Some(TicketCategory::Premium),
                seat_number: Some("P9-9".to_string()),
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.category, TicketCategory::Premium);
    assert_eq!(updated.price, Decimal::from(1_500_000));
    assert_eq!(updated.seat_number, "P9-9");

    // seat accounting is untouched by edits
    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 9);
}

#[tokio::test]
async fn confirmed_tickets_reject_edits() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Economy)
        .await
        .expect("purchase");
    ledger.confirm(user, ticket.uuid).await.expect("confirm");

    let err = ledger
        .update_ticket(
            user,
            ticket.uuid,
            TicketUpdate {
                category: Some(TicketCategory::Vip),
                seat_number: None,
            },
        )
        .await
        .expect_err("editing an active ticket");
    assert!(matches!(err, LedgerError::InvalidState(_)));

    let unchanged = ledger.get_ticket(user, ticket.uuid).await.expect("ticket");
    assert_eq!(unchanged.category, TicketCategory::Economy);
    assert_eq!(unchanged.price, Decimal::from(350_000));
}

#[tokio::test]
async fn tickets_are_owner_scoped() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let ticket = ledger
        .purchase(owner, m.uuid, TicketCategory::Regular)
        .await
        .expect("purchase");

    for err in [
        ledger.get_ticket(stranger, ticket.uuid).await.unwrap_err(),
        ledger.confirm(stranger, ticket.uuid).await.unwrap_err(),
        ledger.cancel(stranger, ticket.uuid).await.unwrap_err(),
    ] {
        assert!(matches!(err, LedgerError::NotFound("Ticket")));
    }

    // the stranger's attempts changed nothing
    let m = ledger.get_match(m.uuid).await.expect("match");
    assert_eq!(m.available_seats, 9);
    let t = ledger.get_ticket(owner, ticket.uuid).await.expect("ticket");
    assert_eq!(t.status, TicketStatus::Pending);
}

#[tokio::test]
async fn match_deletion_blocked_while_tickets_are_live() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    let ticket = ledger
        .purchase(user, m.uuid, TicketCategory::Vip)
        .await
        .expect("purchase");

    let err = ledger.delete_match(m.uuid).await.expect_err("live ticket");
    assert!(matches!(err, LedgerError::InvalidState(_)));

    ledger.cancel(user, ticket.uuid).await.expect("cancel");
    ledger.delete_match(m.uuid).await.expect("delete");

    let err = ledger.get_match(m.uuid).await.expect_err("gone");
    assert!(matches!(err, LedgerError::NotFound("Match")));
}

#[tokio::test]
async fn seat_labels_never_repeat_within_a_match() {
    let ledger = ledger();
    let m = seed_match(&ledger, 60).await;
    let user = Uuid::new_v4();

    let mut labels = std::collections::HashSet::new();
    for _ in 0..60 {
        let ticket = ledger
            .purchase(user, m.uuid, TicketCategory::Regular)
            .await
            .expect("purchase");
        assert!(labels.insert(ticket.seat_number), "duplicate seat label");
    }
}

#[tokio::test]
async fn counter_matches_live_ticket_count_after_mixed_operations() {
    let ledger = ledger();
    let m = seed_match(&ledger, 20).await;
    let user = Uuid::new_v4();

    let mut tickets = Vec::new();
    for _ in 0..8 {
        tickets.push(
            ledger
                .purchase(user, m.uuid, TicketCategory::Regular)
                .await
                .expect("purchase"),
        );
    }
    ledger.confirm(user, tickets[0].uuid).await.expect("confirm");
    ledger.confirm(user, tickets[1].uuid).await.expect("confirm");
    ledger.cancel(user, tickets[1].uuid).await.expect("cancel active");
    ledger.cancel(user, tickets[2].uuid).await.expect("cancel pending");

    let m = ledger.get_match(m.uuid).await.expect("match");
    let live = ledger
        .match_tickets(m.uuid)
        .await
        .expect("tickets")
        .iter()
        .filter(|t| {
            matches!(
                t.status,
                TicketStatus::Pending | TicketStatus::Active | TicketStatus::Used
            )
        })
        .count() as i32;

    assert_eq!(m.available_seats, m.total_seats - live);
    assert_eq!(m.available_seats, 14);
}

#[tokio::test]
async fn ticket_listing_filters_by_status() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    let t1 = ledger
        .purchase(user, m.uuid, TicketCategory::Regular)
        .await
        .expect("t1");
    let t2 = ledger
        .purchase(user, m.uuid, TicketCategory::Vip)
        .await
        .expect("t2");
    ledger.confirm(user, t1.uuid).await.expect("confirm");

    let active = ledger
        .list_tickets(
            user,
            &TicketFilter {
                status: Some(TicketStatus::Active),
                ..Default::default()
            },
        )
        .await
        .expect("list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].uuid, t1.uuid);

    let pending = ledger
        .list_tickets(
            user,
            &TicketFilter {
                status: Some(TicketStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .expect("list");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].uuid, t2.uuid);
}

#[tokio::test]
async fn growing_total_seats_preserves_the_sold_count() {
    let ledger = ledger();
    let m = seed_match(&ledger, 10).await;
    let user = Uuid::new_v4();

    for _ in 0..4 {
        ledger
            .purchase(user, m.uuid, TicketCategory::Regular)
            .await
            .expect("purchase");
    }

    let grown = ledger
        .update_match(
            m.uuid,
            MatchPatch {
                total_seats: Some(30),
                ..Default::default()
            },
        )
        .await
        .expect("grow");

    assert_eq!(grown.total_seats, 30);
    assert_eq!(grown.available_seats, 26);
}

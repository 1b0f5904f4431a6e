mod common;

use common::{assert_ledger_balanced, available, new_flight, user};
use skybook_booking::{BookingEngine, RetryPolicy};
use skybook_core::{CoreError, FlightRepository, InMemoryStore};
use skybook_shared::{CabinClass, TicketId};
use std::sync::Arc;

fn engine(store: &InMemoryStore) -> BookingEngine {
    BookingEngine::new(Arc::new(store.clone()), RetryPolicy::default())
}

#[tokio::test]
async fn test_book_then_cancel_restores_counter() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let flight_id = store.seed_flight(new_flight("OS792", 4)).await;

    let ticket_id = engine.book(user_id, flight_id, "c7").await.unwrap();
    assert_eq!(available(&store, flight_id).await, 3);

    let bookings = store.list_bookings_for_user(user_id).await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].ticket.id, ticket_id);
    assert_eq!(bookings[0].ticket.seat.as_str(), "C7");
    assert_eq!(bookings[0].ticket.class, CabinClass::Economy);

    engine.cancel(ticket_id).await.unwrap();
    assert_eq!(available(&store, flight_id).await, 4);
    assert!(store.list_bookings_for_user(user_id).await.unwrap().is_empty());
    assert_ledger_balanced(&store).await;
}

#[tokio::test]
async fn test_last_seat_books_once() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let flight_id = store.seed_flight(new_flight("OS792", 1)).await;

    engine.book(user_id, flight_id, "A1").await.unwrap();
    assert_eq!(available(&store, flight_id).await, 0);

    let second = engine.book(user_id, flight_id, "B2").await;
    assert!(matches!(second, Err(CoreError::NoSeatsAvailable(id)) if id == flight_id));
    assert_eq!(available(&store, flight_id).await, 0);
    assert_ledger_balanced(&store).await;
}

#[tokio::test]
async fn test_invalid_seat_is_rejected_before_touching_the_ledger() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let flight_id = store.seed_flight(new_flight("OS792", 2)).await;

    for seat in ["", "12A", "A0", "AA1", "A-1"] {
        let result = engine.book(user_id, flight_id, seat).await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))), "{:?}", seat);
    }
    assert_eq!(available(&store, flight_id).await, 2);
}

#[tokio::test]
async fn test_taken_seat_is_compensated() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let first = user(&store, "a@b.com").await;
    let second = user(&store, "c@d.com").await;
    let flight_id = store.seed_flight(new_flight("OS792", 5)).await;

    engine.book(first, flight_id, "D4").await.unwrap();
    let collision = engine.book(second, flight_id, "d4").await;

    assert!(matches!(collision, Err(CoreError::SeatTaken { flight_id: id, .. }) if id == flight_id));
    assert_eq!(available(&store, flight_id).await, 4);
    assert_ledger_balanced(&store).await;
}

#[tokio::test]
async fn test_zero_padded_seat_is_the_same_seat() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let first = user(&store, "a@b.com").await;
    let second = user(&store, "c@d.com").await;
    let flight_id = store.seed_flight(new_flight("OS792", 5)).await;

    engine.book(first, flight_id, "A1").await.unwrap();
    let padded = engine.book(second, flight_id, "A01").await;

    assert!(matches!(padded, Err(CoreError::SeatTaken { seat, .. }) if seat.as_str() == "A1"));
    assert_eq!(available(&store, flight_id).await, 4);
    assert!(store.list_bookings_for_user(second).await.unwrap().is_empty());
    assert_ledger_balanced(&store).await;
}

#[tokio::test]
async fn test_book_unknown_flight() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;

    let result = engine.book(user_id, skybook_shared::FlightId::new(), "A1").await;
    assert!(matches!(result, Err(CoreError::FlightNotFound(_))));
}

#[tokio::test]
async fn test_cancel_unknown_ticket() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let flight_id = store.seed_flight(new_flight("OS792", 2)).await;

    let missing = TicketId::new();
    let result = engine.cancel(missing).await;
    assert!(matches!(result, Err(CoreError::TicketNotFound(id)) if id == missing));
    assert_eq!(available(&store, flight_id).await, 2);
}

#[tokio::test]
async fn test_cancel_twice() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let flight_id = store.seed_flight(new_flight("OS792", 2)).await;

    let ticket_id = engine.book(user_id, flight_id, "A1").await.unwrap();
    engine.cancel(ticket_id).await.unwrap();

    assert!(matches!(engine.cancel(ticket_id).await, Err(CoreError::TicketNotFound(_))));
    assert_eq!(available(&store, flight_id).await, 2);
}

#[tokio::test]
async fn test_rebook_moves_seat_between_flights() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let from = store.seed_flight(new_flight("OS792", 3)).await;
    let mut exclusive = new_flight("OS794", 3);
    exclusive.is_exclusive = true;
    let to = store.seed_flight(exclusive).await;

    let ticket_id = engine.book(user_id, from, "A1").await.unwrap();
    engine.rebook(ticket_id, to, "B1").await.unwrap();

    assert_eq!(available(&store, from).await, 3);
    assert_eq!(available(&store, to).await, 2);

    let bookings = store.list_bookings_for_user(user_id).await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].flight.id, to);
    assert_eq!(bookings[0].ticket.seat.as_str(), "B1");
    assert_eq!(bookings[0].ticket.class, CabinClass::Business);
    assert_ledger_balanced(&store).await;
}

#[tokio::test]
async fn test_rebook_to_full_flight_changes_nothing() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let other = user(&store, "c@d.com").await;
    let from = store.seed_flight(new_flight("OS792", 3)).await;
    let full = store.seed_flight(new_flight("OS794", 1)).await;

    let ticket_id = engine.book(user_id, from, "A1").await.unwrap();
    engine.book(other, full, "A1").await.unwrap();

    let result = engine.rebook(ticket_id, full, "B1").await;
    assert!(matches!(result, Err(CoreError::NoSeatsAvailable(id)) if id == full));

    assert_eq!(available(&store, from).await, 2);
    assert_eq!(available(&store, full).await, 0);
    let bookings = store.list_bookings_for_user(user_id).await.unwrap();
    assert_eq!(bookings[0].flight.id, from);
    assert_eq!(bookings[0].ticket.seat.as_str(), "A1");
    assert_ledger_balanced(&store).await;
}

#[tokio::test]
async fn test_rebook_into_taken_seat_is_compensated() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let other = user(&store, "c@d.com").await;
    let from = store.seed_flight(new_flight("OS792", 3)).await;
    let to = store.seed_flight(new_flight("OS794", 3)).await;

    let ticket_id = engine.book(user_id, from, "A1").await.unwrap();
    engine.book(other, to, "C3").await.unwrap();

    let result = engine.rebook(ticket_id, to, "C3").await;
    assert!(matches!(result, Err(CoreError::SeatTaken { .. })));
    assert_eq!(available(&store, from).await, 2);
    assert_eq!(available(&store, to).await, 2);
    assert_ledger_balanced(&store).await;
}

#[tokio::test]
async fn test_seat_move_on_full_flight() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let flight_id = store.seed_flight(new_flight("OS792", 1)).await;

    let ticket_id = engine.book(user_id, flight_id, "A1").await.unwrap();
    engine.rebook(ticket_id, flight_id, "F9").await.unwrap();

    assert_eq!(available(&store, flight_id).await, 0);
    let bookings = store.list_bookings_for_user(user_id).await.unwrap();
    assert_eq!(bookings[0].ticket.seat.as_str(), "F9");
    assert_ledger_balanced(&store).await;
}

#[tokio::test]
async fn test_rebook_unknown_ticket() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let to = store.seed_flight(new_flight("OS794", 2)).await;

    let result = engine.rebook(TicketId::new(), to, "A1").await;
    assert!(matches!(result, Err(CoreError::TicketNotFound(_))));
    assert_eq!(available(&store, to).await, 2);
}

#[tokio::test]
async fn test_invariant_holds_across_mixed_operations() {
    let store = InMemoryStore::new();
    let engine = engine(&store);
    let user_id = user(&store, "a@b.com").await;
    let flights = [
        store.seed_flight(new_flight("OS790", 2)).await,
        store.seed_flight(new_flight("OS792", 3)).await,
        store.seed_flight(new_flight("OS794", 1)).await,
    ];

    let mut tickets = Vec::new();
    for (i, seat) in ["A1", "A2", "A3", "A4", "A5", "A6", "A7"].iter().enumerate() {
        if let Ok(ticket_id) = engine.book(user_id, flights[i % 3], seat).await {
            tickets.push(ticket_id);
        }
    }
    assert_ledger_balanced(&store).await;

    for (i, ticket_id) in tickets.iter().enumerate() {
        let _ = engine.rebook(*ticket_id, flights[(i + 1) % 3], &format!("R{}", i + 1)).await;
        assert_ledger_balanced(&store).await;
    }

    for ticket_id in tickets.iter().step_by(2) {
        engine.cancel(*ticket_id).await.unwrap();
        assert_ledger_balanced(&store).await;
    }
}

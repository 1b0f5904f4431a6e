#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use skybook_core::{FlightRepository, InMemoryStore, NewUser, UserRepository};
use skybook_shared::{Flight, FlightId, Masked, NewFlight, UserId};

pub fn new_flight(number: &str, capacity: i32) -> NewFlight {
    let departure = Utc.with_ymd_and_hms(2025, 7, 14, 6, 45, 0).unwrap();
    NewFlight {
        flight_number: number.to_string(),
        origin: "Sofia".to_string(),
        destination: "Vienna".to_string(),
        departure_time: departure,
        arrival_time: departure + Duration::minutes(95),
        price_amount: 12900,
        price_currency: "EUR".to_string(),
        is_exclusive: false,
        capacity,
    }
}

pub async fn user(store: &InMemoryStore, email: &str) -> UserId {
    store
        .insert_user(NewUser {
            email: email.to_string(),
            first_name: "Ivan".to_string(),
            last_name: "Georgiev".to_string(),
            password_hash: Masked::from("$argon2id$placeholder"),
            profile_image: None,
        })
        .await
        .unwrap()
}

pub async fn flight(store: &InMemoryStore, flight_id: FlightId) -> Flight {
    store.find_flight(flight_id).await.unwrap().unwrap()
}

pub async fn available(store: &InMemoryStore, flight_id: FlightId) -> i32 {
    flight(store, flight_id).await.available_seats
}

/// `available_seats + tickets == capacity` for every flight.
pub async fn assert_ledger_balanced(store: &InMemoryStore) {
    for count in store.seat_counts().await.unwrap() {
        assert!(count.is_balanced(), "ledger out of balance: {:?}", count);
    }
}

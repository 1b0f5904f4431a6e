//! In-process implementation of every storage trait.
//!
//! A ledger transaction owns the store lock for its whole lifetime, so
//! transactions are serialized. Each mutation pushes an undo entry; rollback
//! (explicit, or by dropping the transaction) replays them in reverse.

use crate::ledger::{LedgerTx, SeatCount, SeatLedger};
use crate::repository::{FlightRepository, NewUser, StorageError, UserRecord, UserRepository};
use crate::search::FlightFilter;
use async_trait::async_trait;
use chrono::Utc;
use skybook_shared::{
    Booking, Flight, FlightId, NewFlight, SeatLabel, Ticket, TicketId, User, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
struct MemoryState {
    flights: HashMap<FlightId, Flight>,
    tickets: HashMap<TicketId, Ticket>,
    occupied: HashMap<(FlightId, SeatLabel), TicketId>,
    users: HashMap<UserId, UserRecord>,
    emails: HashMap<String, UserId>,
}

enum Undo {
    SeatDelta { flight_id: FlightId, delta: i32 },
    TicketCreated(TicketId),
    TicketDeleted(Ticket),
    TicketUpdated(Ticket),
}

impl MemoryState {
    fn revert(&mut self, entry: Undo) {
        match entry {
            Undo::SeatDelta { flight_id, delta } => {
                if let Some(flight) = self.flights.get_mut(&flight_id) {
                    flight.available_seats -= delta;
                }
            }
            Undo::TicketCreated(ticket_id) => {
                if let Some(ticket) = self.tickets.remove(&ticket_id) {
                    self.occupied.remove(&(ticket.flight_id, ticket.seat));
                }
            }
            Undo::TicketDeleted(ticket) => {
                self.occupied.insert((ticket.flight_id, ticket.seat.clone()), ticket.id);
                self.tickets.insert(ticket.id, ticket);
            }
            Undo::TicketUpdated(previous) => {
                if let Some(current) = self.tickets.remove(&previous.id) {
                    self.occupied.remove(&(current.flight_id, current.seat));
                }
                self.occupied.insert((previous.flight_id, previous.seat.clone()), previous.id);
                self.tickets.insert(previous.id, previous);
            }
        }
    }

    fn flight_mut(&mut self, flight_id: FlightId) -> Result<&mut Flight, StorageError> {
        self.flights
            .get_mut(&flight_id)
            .ok_or(StorageError::FlightNotFound(flight_id))
    }

    fn seat_holder(&self, flight_id: FlightId, seat: &SeatLabel) -> Option<TicketId> {
        self.occupied.get(&(flight_id, seat.clone())).copied()
    }
}

/// Shared handle; clones see the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flight with every seat available.
    pub async fn seed_flight(&self, flight: NewFlight) -> FlightId {
        let id = FlightId::new();
        self.state
            .lock()
            .await
            .flights
            .insert(id, flight.into_flight(id));
        id
    }
}

#[async_trait]
impl SeatLedger for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StorageError> {
        let state = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryLedgerTx {
            state,
            undo: Vec::new(),
        }))
    }
}

pub struct MemoryLedgerTx {
    state: OwnedMutexGuard<MemoryState>,
    undo: Vec<Undo>,
}

impl MemoryLedgerTx {
    fn revert_all(&mut self) {
        while let Some(entry) = self.undo.pop() {
            self.state.revert(entry);
        }
    }
}

impl Drop for MemoryLedgerTx {
    fn drop(&mut self) {
        self.revert_all();
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn try_reserve_seat(&mut self, flight_id: FlightId) -> Result<bool, StorageError> {
        let flight = self.state.flight_mut(flight_id)?;
        if flight.available_seats < 1 {
            return Ok(false);
        }
        flight.available_seats -= 1;
        self.undo.push(Undo::SeatDelta { flight_id, delta: -1 });
        Ok(true)
    }

    async fn release_seat(&mut self, flight_id: FlightId) -> Result<(), StorageError> {
        let flight = self.state.flight_mut(flight_id)?;
        flight.available_seats += 1;
        self.undo.push(Undo::SeatDelta { flight_id, delta: 1 });
        Ok(())
    }

    async fn create_ticket(
        &mut self,
        user_id: UserId,
        flight_id: FlightId,
        seat: &SeatLabel,
    ) -> Result<TicketId, StorageError> {
        let state = &mut *self.state;
        let class = state.flight_mut(flight_id)?.cabin_class();
        if !state.users.contains_key(&user_id) {
            return Err(StorageError::Backend(format!("User {} does not exist", user_id)));
        }
        if state.seat_holder(flight_id, seat).is_some() {
            return Err(StorageError::SeatTaken {
                flight_id,
                seat: seat.clone(),
            });
        }

        let now = Utc::now();
        let ticket = Ticket {
            id: TicketId::new(),
            user_id,
            flight_id,
            seat: seat.clone(),
            class,
            booked_at: now,
            updated_at: now,
        };
        let ticket_id = ticket.id;
        state.occupied.insert((flight_id, seat.clone()), ticket_id);
        state.tickets.insert(ticket_id, ticket);
        self.undo.push(Undo::TicketCreated(ticket_id));

        Ok(ticket_id)
    }

    async fn find_ticket(&mut self, ticket_id: TicketId) -> Result<Option<Ticket>, StorageError> {
        Ok(self.state.tickets.get(&ticket_id).cloned())
    }

    async fn delete_ticket(&mut self, ticket_id: TicketId) -> Result<bool, StorageError> {
        let state = &mut *self.state;
        match state.tickets.remove(&ticket_id) {
            Some(ticket) => {
                state.occupied.remove(&(ticket.flight_id, ticket.seat.clone()));
                self.undo.push(Undo::TicketDeleted(ticket));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_ticket(
        &mut self,
        ticket_id: TicketId,
        new_flight_id: FlightId,
        new_seat: &SeatLabel,
    ) -> Result<(), StorageError> {
        let state = &mut *self.state;
        let previous = state
            .tickets
            .get(&ticket_id)
            .cloned()
            .ok_or(StorageError::TicketNotFound(ticket_id))?;
        let class = state.flight_mut(new_flight_id)?.cabin_class();
        if let Some(holder) = state.seat_holder(new_flight_id, new_seat) {
            if holder != ticket_id {
                return Err(StorageError::SeatTaken {
                    flight_id: new_flight_id,
                    seat: new_seat.clone(),
                });
            }
        }

        state
            .occupied
            .remove(&(previous.flight_id, previous.seat.clone()));
        state
            .occupied
            .insert((new_flight_id, new_seat.clone()), ticket_id);
        if let Some(ticket) = state.tickets.get_mut(&ticket_id) {
            ticket.flight_id = new_flight_id;
            ticket.seat = new_seat.clone();
            ticket.class = class;
            ticket.updated_at = Utc::now();
        }
        self.undo.push(Undo::TicketUpdated(previous));

        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        self.undo.clear();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StorageError> {
        self.revert_all();
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<UserId, StorageError> {
        let mut state = self.state.lock().await;
        if state.emails.contains_key(&new_user.email) {
            return Err(StorageError::DuplicateEmail(new_user.email));
        }

        let user = User {
            id: UserId::new(),
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            profile_image: new_user.profile_image,
            created_at: Utc::now(),
        };
        let id = user.id;
        state.emails.insert(user.email.clone(), id);
        state.users.insert(
            id,
            UserRecord {
                user,
                password_hash: new_user.password_hash,
            },
        );
        Ok(id)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .emails
            .get(email)
            .and_then(|id| state.users.get(id))
            .cloned())
    }
}

#[async_trait]
impl FlightRepository for InMemoryStore {
    async fn list_available_flights(
        &self,
        filter: &FlightFilter,
    ) -> Result<Vec<Flight>, StorageError> {
        let state = self.state.lock().await;
        let mut flights: Vec<Flight> = state
            .flights
            .values()
            .filter(|flight| filter.matches(flight))
            .cloned()
            .collect();
        flights.sort_by(|a, b| {
            a.departure_time
                .cmp(&b.departure_time)
                .then_with(|| a.flight_number.cmp(&b.flight_number))
        });
        Ok(flights)
    }

    async fn find_flight(&self, flight_id: FlightId) -> Result<Option<Flight>, StorageError> {
        Ok(self.state.lock().await.flights.get(&flight_id).cloned())
    }

    async fn list_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StorageError> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .tickets
            .values()
            .filter(|ticket| ticket.user_id == user_id)
            .filter_map(|ticket| {
                state.flights.get(&ticket.flight_id).map(|flight| Booking {
                    ticket: ticket.clone(),
                    flight: flight.clone(),
                })
            })
            .collect();
        bookings.sort_by(|a, b| {
            a.flight
                .departure_time
                .cmp(&b.flight.departure_time)
                .then_with(|| a.ticket.seat.cmp(&b.ticket.seat))
        });
        Ok(bookings)
    }

    async fn seat_counts(&self) -> Result<Vec<SeatCount>, StorageError> {
        let state = self.state.lock().await;
        let mut tickets_per_flight: HashMap<FlightId, i64> = HashMap::new();
        for ticket in state.tickets.values() {
            *tickets_per_flight.entry(ticket.flight_id).or_default() += 1;
        }

        let mut counts: Vec<SeatCount> = state
            .flights
            .values()
            .map(|flight| SeatCount {
                flight_id: flight.id,
                flight_number: flight.flight_number.clone(),
                capacity: flight.capacity,
                available_seats: flight.available_seats,
                tickets: tickets_per_flight.get(&flight.id).copied().unwrap_or(0),
            })
            .collect();
        counts.sort_by(|a, b| a.flight_number.cmp(&b.flight_number));
        Ok(counts)
    }
}

//! The seat ledger: authoritative store of per-flight seat counters and
//! ticket rows.
//!
//! Every mutation happens inside a [`LedgerTx`] obtained from
//! [`SeatLedger::begin`]. A transaction that is dropped without
//! [`LedgerTx::commit`] is rolled back.

use crate::repository::StorageError;
use async_trait::async_trait;
use serde::Serialize;
use skybook_shared::{FlightId, SeatLabel, Ticket, TicketId, UserId};

#[async_trait]
pub trait SeatLedger: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StorageError>;
}

#[async_trait]
pub trait LedgerTx: Send {
    /// Decrements the flight's available seats iff at least one is left.
    ///
    /// Returns `false` when the flight is sold out. The check and the
    /// decrement are a single step; concurrent callers on the same flight
    /// cannot both observe the last seat.
    async fn try_reserve_seat(&mut self, flight_id: FlightId) -> Result<bool, StorageError>;

    /// Increments the flight's available seats by one. No capacity check.
    async fn release_seat(&mut self, flight_id: FlightId) -> Result<(), StorageError>;

    /// Inserts a ticket whose class is inherited from the flight.
    async fn create_ticket(
        &mut self,
        user_id: UserId,
        flight_id: FlightId,
        seat: &SeatLabel,
    ) -> Result<TicketId, StorageError>;

    /// Reads a ticket and locks it until the transaction ends.
    async fn find_ticket(&mut self, ticket_id: TicketId) -> Result<Option<Ticket>, StorageError>;

    /// Returns `false` if no such ticket exists.
    async fn delete_ticket(&mut self, ticket_id: TicketId) -> Result<bool, StorageError>;

    /// Moves a ticket to another flight and/or seat, re-inheriting the class.
    async fn update_ticket(
        &mut self,
        ticket_id: TicketId,
        new_flight_id: FlightId,
        new_seat: &SeatLabel,
    ) -> Result<(), StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

/// Seat accounting for one flight, used to audit the ledger invariant
/// `available_seats + tickets == capacity`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeatCount {
    pub flight_id: FlightId,
    pub flight_number: String,
    pub capacity: i32,
    pub available_seats: i32,
    pub tickets: i64,
}

impl SeatCount {
    pub fn is_balanced(&self) -> bool {
        i64::from(self.available_seats) + self.tickets == i64::from(self.capacity)
    }

    /// Positive when seats leaked (counter too low for the tickets held),
    /// negative when the flight is oversold.
    pub fn drift(&self) -> i64 {
        i64::from(self.capacity) - i64::from(self.available_seats) - self.tickets
    }
}

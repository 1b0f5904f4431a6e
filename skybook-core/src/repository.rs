use crate::ledger::SeatCount;
use crate::search::FlightFilter;
use async_trait::async_trait;
use skybook_shared::{Booking, Flight, FlightId, Masked, SeatLabel, TicketId, User, UserId};

/// Failures reported by storage backends.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("Flight not found: {0}")]
    FlightNotFound(FlightId),

    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Seat {seat} is already taken on flight {flight_id}")]
    SeatTaken { flight_id: FlightId, seat: SeatLabel },

    /// Serialization failures, deadlocks, pool exhaustion, dropped connections
    #[error("Transient storage failure: {0}")]
    Transient(String),

    #[error("Storage failure: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

/// Account row as handed to storage. The hash is an Argon2 PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Masked<String>,
    pub profile_image: Option<Vec<u8>>,
}

/// Stored account including its credential hash
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: Masked<String>,
}

/// Repository trait for account data access
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`StorageError::DuplicateEmail`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<UserId, StorageError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;
}

/// Repository trait for read-only flight and booking access
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Flights with at least one free seat matching every predicate of `filter`,
    /// ordered by departure.
    async fn list_available_flights(&self, filter: &FlightFilter)
        -> Result<Vec<Flight>, StorageError>;

    async fn find_flight(&self, flight_id: FlightId) -> Result<Option<Flight>, StorageError>;

    async fn list_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StorageError>;

    /// Counter and ticket totals for every flight
    async fn seat_counts(&self) -> Result<Vec<SeatCount>, StorageError>;
}

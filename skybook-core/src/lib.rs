pub mod account;
pub mod ledger;
pub mod memory;
pub mod query;
pub mod repository;
pub mod search;
pub mod validation;

pub use account::{AccountService, HashingParams, NewAccount};
pub use ledger::{LedgerTx, SeatCount, SeatLedger};
pub use memory::InMemoryStore;
pub use query::QueryService;
pub use repository::{FlightRepository, NewUser, StorageError, UserRecord, UserRepository};
pub use search::{FlightFilter, FlightPredicate};

use skybook_shared::{FlightId, SeatLabel, SeatLabelError, TicketId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),
    #[error("Invalid email or password")]
    AuthFailure,
    #[error("No seats available on flight {0}")]
    NoSeatsAvailable(FlightId),
    #[error("Seat {seat} is already taken on flight {flight_id}")]
    SeatTaken { flight_id: FlightId, seat: SeatLabel },
    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),
    #[error("Flight not found: {0}")]
    FlightNotFound(FlightId),
    #[error("Persistence failure: {0}")]
    PersistenceError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::FlightNotFound(id) => CoreError::FlightNotFound(id),
            StorageError::TicketNotFound(id) => CoreError::TicketNotFound(id),
            StorageError::DuplicateEmail(email) => CoreError::DuplicateEmail(email),
            StorageError::SeatTaken { flight_id, seat } => CoreError::SeatTaken { flight_id, seat },
            StorageError::Transient(msg) | StorageError::Backend(msg) => {
                CoreError::PersistenceError(msg)
            }
        }
    }
}

impl From<SeatLabelError> for CoreError {
    fn from(err: SeatLabelError) -> Self {
        CoreError::ValidationError(err.to_string())
    }
}

pub mod ids;
pub mod models;
pub mod pii;
pub mod seat;

pub use ids::{FlightId, TicketId, UserId};
pub use models::{Booking, CabinClass, Flight, NewFlight, Ticket, User};
pub use pii::Masked;
pub use seat::{SeatLabel, SeatLabelError};

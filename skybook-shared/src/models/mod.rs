pub mod flight;
pub mod ticket;
pub mod user;

pub use flight::{CabinClass, Flight, NewFlight};
pub use ticket::{Booking, Ticket};
pub use user::User;

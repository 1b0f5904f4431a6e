use crate::ids::{FlightId, TicketId, UserId};
use crate::models::flight::{CabinClass, Flight};
use crate::seat::SeatLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One booked seat on one flight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub flight_id: FlightId,
    pub seat: SeatLabel,
    /// Inherited from the flight when the ticket was (re)booked
    pub class: CabinClass,
    pub booked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A ticket joined with the flight it is booked on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub ticket: Ticket,
    pub flight: Flight,
}

//! Row shapes for runtime-checked queries.

use chrono::{DateTime, Utc};
use skybook_core::{SeatCount, StorageError, UserRecord};
use skybook_shared::{
    Booking, CabinClass, Flight, FlightId, Masked, SeatLabel, Ticket, TicketId, User, UserId,
};
use uuid::Uuid;

pub(crate) const FLIGHT_COLUMNS: &str = "id, flight_number, origin, destination, departure_time, \
     arrival_time, price_amount, price_currency, is_exclusive, capacity, available_seats";

pub(crate) const TICKET_COLUMNS: &str =
    "id, user_id, flight_id, seat_label, cabin_class, booked_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct FlightRow {
    id: Uuid,
    flight_number: String,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    price_amount: i32,
    price_currency: String,
    is_exclusive: bool,
    capacity: i32,
    available_seats: i32,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: FlightId::from_uuid(row.id),
            flight_number: row.flight_number,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            price_amount: row.price_amount,
            price_currency: row.price_currency,
            is_exclusive: row.is_exclusive,
            capacity: row.capacity,
            available_seats: row.available_seats,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TicketRow {
    id: Uuid,
    user_id: Uuid,
    flight_id: Uuid,
    seat_label: String,
    cabin_class: String,
    booked_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StorageError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let seat = SeatLabel::parse(&row.seat_label).map_err(|e| {
            StorageError::Backend(format!("Ticket {} has a corrupt seat label: {}", row.id, e))
        })?;
        let class: CabinClass = row.cabin_class.parse().map_err(StorageError::Backend)?;

        Ok(Ticket {
            id: TicketId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            flight_id: FlightId::from_uuid(row.flight_id),
            seat,
            class,
            booked_at: row.booked_at,
            updated_at: row.updated_at,
        })
    }
}

/// Ticket columns are aliased; the flight's own columns keep their names.
#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    ticket_id: Uuid,
    user_id: Uuid,
    seat_label: String,
    cabin_class: String,
    booked_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    flight: FlightRow,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StorageError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let ticket = TicketRow {
            id: row.ticket_id,
            user_id: row.user_id,
            flight_id: row.flight.id,
            seat_label: row.seat_label,
            cabin_class: row.cabin_class,
            booked_at: row.booked_at,
            updated_at: row.updated_at,
        };
        Ok(Booking {
            ticket: Ticket::try_from(ticket)?,
            flight: Flight::from(row.flight),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    profile_image: Option<Vec<u8>>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            user: User {
                id: UserId::from_uuid(row.id),
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                profile_image: row.profile_image,
                created_at: row.created_at,
            },
            password_hash: Masked::new(row.password_hash),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeatCountRow {
    flight_id: Uuid,
    flight_number: String,
    capacity: i32,
    available_seats: i32,
    tickets: i64,
}

impl From<SeatCountRow> for SeatCount {
    fn from(row: SeatCountRow) -> Self {
        SeatCount {
            flight_id: FlightId::from_uuid(row.flight_id),
            flight_number: row.flight_number,
            capacity: row.capacity,
            available_seats: row.available_seats,
            tickets: row.tickets,
        }
    }
}

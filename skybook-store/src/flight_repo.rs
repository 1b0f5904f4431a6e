use crate::database::map_sqlx;
use crate::rows::{BookingRow, FlightRow, SeatCountRow, FLIGHT_COLUMNS};
use async_trait::async_trait;
use skybook_core::{FlightFilter, FlightPredicate, FlightRepository, SeatCount, StorageError};
use skybook_shared::{Booking, Flight, FlightId, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder};

pub struct PgFlightRepository {
    pool: PgPool,
}

impl PgFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Renders the filter as a parameterized query. Values only ever reach
/// Postgres as bind parameters.
pub fn available_flights_query(filter: &FlightFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {} FROM flights WHERE available_seats > 0",
        FLIGHT_COLUMNS
    ));

    for predicate in filter.predicates() {
        match predicate {
            FlightPredicate::DepartureCity(city) => {
                query.push(" AND origin = ").push_bind(city);
            }
            FlightPredicate::ArrivalCity(city) => {
                query.push(" AND destination = ").push_bind(city);
            }
            FlightPredicate::DepartureDate(date) => {
                query
                    .push(" AND (departure_time AT TIME ZONE 'UTC')::date = ")
                    .push_bind(date);
            }
            FlightPredicate::ExclusiveOnly => {
                query.push(" AND is_exclusive");
            }
        }
    }

    query.push(" ORDER BY departure_time, flight_number");
    query
}

#[async_trait]
impl FlightRepository for PgFlightRepository {
    async fn list_available_flights(
        &self,
        filter: &FlightFilter,
    ) -> Result<Vec<Flight>, StorageError> {
        let rows: Vec<FlightRow> = available_flights_query(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn find_flight(&self, flight_id: FlightId) -> Result<Option<Flight>, StorageError> {
        let row: Option<FlightRow> =
            sqlx::query_as(&format!("SELECT {} FROM flights WHERE id = $1", FLIGHT_COLUMNS))
                .bind(flight_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;

        Ok(row.map(Flight::from))
    }

    async fn list_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>, StorageError> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            r#"
            SELECT t.id AS ticket_id, t.user_id, t.seat_label, t.cabin_class, t.booked_at, t.updated_at,
                   f.id, f.flight_number, f.origin, f.destination, f.departure_time, f.arrival_time,
                   f.price_amount, f.price_currency, f.is_exclusive, f.capacity, f.available_seats
            FROM tickets t
            JOIN flights f ON f.id = t.flight_id
            WHERE t.user_id = $1
            ORDER BY f.departure_time, t.seat_label
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn seat_counts(&self) -> Result<Vec<SeatCount>, StorageError> {
        let rows: Vec<SeatCountRow> = sqlx::query_as(
            r#"
            SELECT f.id AS flight_id, f.flight_number, f.capacity, f.available_seats,
                   COUNT(t.id) AS tickets
            FROM flights f
            LEFT JOIN tickets t ON t.flight_id = f.id
            GROUP BY f.id
            ORDER BY f.flight_number
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(SeatCount::from).collect())
    }
}

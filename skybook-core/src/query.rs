//! Read-only views over flights and bookings. Results are point-in-time
//! snapshots and may trail in-flight transactions.

use crate::ledger::SeatCount;
use crate::repository::FlightRepository;
use crate::search::FlightFilter;
use crate::{CoreError, CoreResult};
use skybook_shared::{Booking, Flight, FlightId, UserId};
use std::sync::Arc;

#[derive(Clone)]
pub struct QueryService {
    flights: Arc<dyn FlightRepository>,
}

impl QueryService {
    pub fn new(flights: Arc<dyn FlightRepository>) -> Self {
        Self { flights }
    }

    pub async fn list_available_flights(&self, filter: &FlightFilter) -> CoreResult<Vec<Flight>> {
        Ok(self.flights.list_available_flights(filter).await?)
    }

    pub async fn flight_details(&self, flight_id: FlightId) -> CoreResult<Flight> {
        self.flights
            .find_flight(flight_id)
            .await?
            .ok_or(CoreError::FlightNotFound(flight_id))
    }

    pub async fn list_bookings_for_user(&self, user_id: UserId) -> CoreResult<Vec<Booking>> {
        Ok(self.flights.list_bookings_for_user(user_id).await?)
    }

    /// Flights whose counter disagrees with their ticket count. Empty when
    /// the ledger is consistent.
    pub async fn audit_ledger(&self) -> CoreResult<Vec<SeatCount>> {
        let counts = self.flights.seat_counts().await?;
        let unbalanced: Vec<SeatCount> = counts.into_iter().filter(|c| !c.is_balanced()).collect();

        for count in &unbalanced {
            tracing::warn!(
                flight_id = %count.flight_id,
                drift = count.drift(),
                "Seat counter out of balance for {}",
                count.flight_number
            );
        }

        Ok(unbalanced)
    }
}

//! Book, cancel and rebook as single ledger transactions.
//!
//! Every operation either applies completely or leaves the ledger as it
//! found it. Once a seat has been reserved, any later failure releases it
//! again before the transaction is rolled back.

use crate::stage::{BookingStage, Operation};
use skybook_core::validation::parse_seat;
use skybook_core::{CoreError, CoreResult, LedgerTx, SeatLedger, StorageError};
use skybook_shared::{FlightId, SeatLabel, TicketId, UserId};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Re-run the whole transaction once after a transient storage failure
    pub retry_transient: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retry_transient: true }
    }
}

/// Why an attempt stopped. Only storage failures are candidates for retry.
enum Abort {
    Rejected(CoreError),
    Storage(StorageError),
}

impl From<StorageError> for Abort {
    fn from(err: StorageError) -> Self {
        Abort::Storage(err)
    }
}

impl From<CoreError> for Abort {
    fn from(err: CoreError) -> Self {
        Abort::Rejected(err)
    }
}

impl From<Abort> for CoreError {
    fn from(abort: Abort) -> Self {
        match abort {
            Abort::Rejected(err) => err,
            Abort::Storage(err) => err.into(),
        }
    }
}

/// One open ledger transaction plus the bookkeeping needed to undo it.
struct BookingTransaction {
    operation: Operation,
    tx: Box<dyn LedgerTx>,
    stage: BookingStage,
    reserved: Option<FlightId>,
}

impl BookingTransaction {
    async fn open(ledger: &dyn SeatLedger, operation: Operation) -> Result<Self, Abort> {
        Ok(Self {
            operation,
            tx: ledger.begin().await?,
            stage: BookingStage::Start,
            reserved: None,
        })
    }

    fn advance(&mut self, next: BookingStage) -> Result<(), Abort> {
        let from = self.stage;
        self.stage
            .transition(next)
            .map_err(|e| CoreError::InternalError(e.to_string()))?;
        debug!(operation = %self.operation, %from, to = %next, "Booking stage advanced");
        Ok(())
    }

    async fn reserve(&mut self, flight_id: FlightId) -> Result<(), Abort> {
        if !self.tx.try_reserve_seat(flight_id).await? {
            return Err(CoreError::NoSeatsAvailable(flight_id).into());
        }
        self.reserved = Some(flight_id);
        self.advance(BookingStage::SeatChecked)
    }

    /// Commits on success, otherwise compensates and rolls back.
    async fn finish<T>(mut self, outcome: Result<T, Abort>) -> Result<T, Abort> {
        let outcome = outcome.and_then(|value| {
            self.advance(BookingStage::Committed)?;
            Ok(value)
        });

        match outcome {
            Ok(value) => {
                // The outcome of a failed commit is unknown, so it is never retried
                if let Err(e) = self.tx.commit().await {
                    warn!(operation = %self.operation, error = %e, "Commit failed");
                    return Err(Abort::Rejected(CoreError::PersistenceError(e.to_string())));
                }
                Ok(value)
            }
            Err(abort) => {
                self.abort().await;
                Err(abort)
            }
        }
    }

    async fn abort(mut self) {
        if let Some(flight_id) = self.reserved.take() {
            if let Err(e) = self.tx.release_seat(flight_id).await {
                warn!(
                    operation = %self.operation,
                    %flight_id,
                    "Compensating seat release failed, relying on rollback: {}",
                    e
                );
            }
        }
        if self.advance(BookingStage::RolledBack).is_err() {
            warn!(operation = %self.operation, stage = %self.stage, "Rolling back a finished transaction");
        }
        if let Err(e) = self.tx.rollback().await {
            warn!(operation = %self.operation, "Rollback failed: {}", e);
        }
    }
}

/// Stateless coordinator over a [`SeatLedger`].
#[derive(Clone)]
pub struct BookingEngine {
    ledger: Arc<dyn SeatLedger>,
    policy: RetryPolicy,
}

impl BookingEngine {
    pub fn new(ledger: Arc<dyn SeatLedger>, policy: RetryPolicy) -> Self {
        Self { ledger, policy }
    }

    /// Reserves a seat on `flight_id` and issues a ticket for it.
    pub async fn book(&self, user_id: UserId, flight_id: FlightId, seat: &str) -> CoreResult<TicketId> {
        let seat = parse_seat(seat)?;

        let result = self
            .with_retry(Operation::Book, || self.book_attempt(user_id, flight_id, &seat))
            .await;

        match &result {
            Ok(ticket_id) => info!(%ticket_id, %flight_id, %user_id, %seat, "Booked seat"),
            Err(e) => warn!(%flight_id, %user_id, %seat, "Booking failed: {}", e),
        }
        result
    }

    /// Deletes the ticket and returns its seat to the flight.
    pub async fn cancel(&self, ticket_id: TicketId) -> CoreResult<()> {
        let result = self
            .with_retry(Operation::Cancel, || self.cancel_attempt(ticket_id))
            .await;

        match &result {
            Ok(flight_id) => info!(%ticket_id, %flight_id, "Cancelled ticket"),
            Err(e) => warn!(%ticket_id, "Cancellation failed: {}", e),
        }
        result.map(|_| ())
    }

    /// Moves a ticket to `new_flight_id`/`seat`. The new seat is reserved
    /// before the old one is released; if the new flight is full the ticket
    /// stays where it was.
    pub async fn rebook(&self, ticket_id: TicketId, new_flight_id: FlightId, seat: &str) -> CoreResult<()> {
        let seat = parse_seat(seat)?;

        let result = self
            .with_retry(Operation::Rebook, || self.rebook_attempt(ticket_id, new_flight_id, &seat))
            .await;

        match &result {
            Ok(old_flight_id) => info!(
                %ticket_id,
                from_flight = %old_flight_id,
                to_flight = %new_flight_id,
                %seat,
                "Rebooked ticket"
            ),
            Err(e) => warn!(%ticket_id, to_flight = %new_flight_id, %seat, "Rebooking failed: {}", e),
        }
        result.map(|_| ())
    }

    async fn with_retry<T, F, Fut>(&self, operation: Operation, mut attempt: F) -> CoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Abort>>,
    {
        match attempt().await {
            Err(Abort::Storage(err)) if err.is_transient() && self.policy.retry_transient => {
                warn!(%operation, "Transient storage failure, retrying once: {}", err);
                attempt().await.map_err(CoreError::from)
            }
            outcome => outcome.map_err(CoreError::from),
        }
    }

    async fn book_attempt(&self, user_id: UserId, flight_id: FlightId, seat: &SeatLabel) -> Result<TicketId, Abort> {
        let mut booking = BookingTransaction::open(self.ledger.as_ref(), Operation::Book).await?;
        let outcome = book_steps(&mut booking, user_id, flight_id, seat).await;
        booking.finish(outcome).await
    }

    async fn cancel_attempt(&self, ticket_id: TicketId) -> Result<FlightId, Abort> {
        let mut booking = BookingTransaction::open(self.ledger.as_ref(), Operation::Cancel).await?;
        let outcome = cancel_steps(&mut booking, ticket_id).await;
        booking.finish(outcome).await
    }

    async fn rebook_attempt(
        &self,
        ticket_id: TicketId,
        new_flight_id: FlightId,
        seat: &SeatLabel,
    ) -> Result<FlightId, Abort> {
        let mut booking = BookingTransaction::open(self.ledger.as_ref(), Operation::Rebook).await?;
        let outcome = rebook_steps(&mut booking, ticket_id, new_flight_id, seat).await;
        booking.finish(outcome).await
    }
}

async fn book_steps(
    booking: &mut BookingTransaction,
    user_id: UserId,
    flight_id: FlightId,
    seat: &SeatLabel,
) -> Result<TicketId, Abort> {
    booking.reserve(flight_id).await?;
    let ticket_id = booking.tx.create_ticket(user_id, flight_id, seat).await?;
    booking.advance(BookingStage::TicketWritten)?;
    Ok(ticket_id)
}

async fn cancel_steps(booking: &mut BookingTransaction, ticket_id: TicketId) -> Result<FlightId, Abort> {
    let ticket = booking
        .tx
        .find_ticket(ticket_id)
        .await?
        .ok_or(CoreError::TicketNotFound(ticket_id))?;

    if !booking.tx.delete_ticket(ticket_id).await? {
        return Err(CoreError::TicketNotFound(ticket_id).into());
    }
    booking.advance(BookingStage::TicketWritten)?;

    booking.tx.release_seat(ticket.flight_id).await?;
    booking.advance(BookingStage::CounterAdjusted)?;
    Ok(ticket.flight_id)
}

/// Returns the flight the ticket was booked on before the move.
async fn rebook_steps(
    booking: &mut BookingTransaction,
    ticket_id: TicketId,
    new_flight_id: FlightId,
    seat: &SeatLabel,
) -> Result<FlightId, Abort> {
    let ticket = booking
        .tx
        .find_ticket(ticket_id)
        .await?
        .ok_or(CoreError::TicketNotFound(ticket_id))?;
    let old_flight_id = ticket.flight_id;

    // Seat change on the same flight, counters untouched
    if old_flight_id == new_flight_id {
        booking.tx.update_ticket(ticket_id, new_flight_id, seat).await?;
        booking.advance(BookingStage::TicketWritten)?;
        return Ok(old_flight_id);
    }

    booking.reserve(new_flight_id).await?;
    booking.tx.update_ticket(ticket_id, new_flight_id, seat).await?;
    booking.advance(BookingStage::TicketWritten)?;

    booking.tx.release_seat(old_flight_id).await?;
    booking.advance(BookingStage::CounterAdjusted)?;
    Ok(old_flight_id)
}

use crate::database::{map_sqlx, unique_violation};
use crate::rows::{TicketRow, TICKET_COLUMNS};
use async_trait::async_trait;
use skybook_core::{LedgerTx, SeatLedger, StorageError};
use skybook_shared::{CabinClass, FlightId, SeatLabel, Ticket, TicketId, UserId};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

const SEAT_CONSTRAINT: &str = "tickets_flight_seat_key";

pub struct PgSeatLedger {
    pool: PgPool,
    transaction_timeout: Duration,
}

impl PgSeatLedger {
    pub fn new(pool: PgPool, transaction_timeout: Duration) -> Self {
        Self {
            pool,
            transaction_timeout,
        }
    }
}

#[async_trait]
impl SeatLedger for PgSeatLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StorageError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Scoped to this transaction; a timeout aborts and rolls it back
        let timeout = format!("{}ms", self.transaction_timeout.as_millis());
        sqlx::query(
            "SELECT set_config('statement_timeout', $1, true), \
                    set_config('idle_in_transaction_session_timeout', $1, true)",
        )
        .bind(timeout)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        Ok(Box::new(PgLedgerTx { tx }))
    }
}

pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerTx {
    async fn flight_class(&mut self, flight_id: FlightId) -> Result<CabinClass, StorageError> {
        let is_exclusive: Option<bool> =
            sqlx::query_scalar("SELECT is_exclusive FROM flights WHERE id = $1")
                .bind(flight_id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(map_sqlx)?;

        is_exclusive
            .map(CabinClass::for_flight)
            .ok_or(StorageError::FlightNotFound(flight_id))
    }

    /// A failed statement poisons the whole Postgres transaction. Ticket
    /// writes run under a savepoint so the caller can still compensate.
    async fn savepoint(&mut self) -> Result<(), StorageError> {
        sqlx::query("SAVEPOINT ticket_write")
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn restore_savepoint(&mut self) {
        if let Err(e) = sqlx::query("ROLLBACK TO SAVEPOINT ticket_write")
            .execute(&mut *self.tx)
            .await
        {
            tracing::warn!("Failed to roll back to savepoint: {}", e);
        }
    }

    async fn write_failed(
        &mut self,
        err: sqlx::Error,
        flight_id: FlightId,
        seat: &SeatLabel,
    ) -> StorageError {
        self.restore_savepoint().await;
        if unique_violation(&err) == Some(SEAT_CONSTRAINT) {
            StorageError::SeatTaken {
                flight_id,
                seat: seat.clone(),
            }
        } else {
            map_sqlx(err)
        }
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn try_reserve_seat(&mut self, flight_id: FlightId) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE flights SET available_seats = available_seats - 1 \
             WHERE id = $1 AND available_seats >= 1",
        )
        .bind(flight_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM flights WHERE id = $1)")
            .bind(flight_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;

        if exists {
            Ok(false)
        } else {
            Err(StorageError::FlightNotFound(flight_id))
        }
    }

    async fn release_seat(&mut self, flight_id: FlightId) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE flights SET available_seats = available_seats + 1 WHERE id = $1")
            .bind(flight_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::FlightNotFound(flight_id));
        }
        Ok(())
    }

    async fn create_ticket(
        &mut self,
        user_id: UserId,
        flight_id: FlightId,
        seat: &SeatLabel,
    ) -> Result<TicketId, StorageError> {
        let class = self.flight_class(flight_id).await?;
        let ticket_id = TicketId::new();

        self.savepoint().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO tickets (id, user_id, flight_id, seat_label, cabin_class)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(ticket_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(flight_id.as_uuid())
        .bind(seat.as_str())
        .bind(class.as_str())
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(ticket_id),
            Err(err) => Err(self.write_failed(err, flight_id, seat).await),
        }
    }

    async fn find_ticket(&mut self, ticket_id: TicketId) -> Result<Option<Ticket>, StorageError> {
        let row: Option<TicketRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tickets WHERE id = $1 FOR UPDATE",
            TICKET_COLUMNS
        ))
        .bind(ticket_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;

        row.map(Ticket::try_from).transpose()
    }

    async fn delete_ticket(&mut self, ticket_id: TicketId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(ticket_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_ticket(
        &mut self,
        ticket_id: TicketId,
        new_flight_id: FlightId,
        new_seat: &SeatLabel,
    ) -> Result<(), StorageError> {
        let class = self.flight_class(new_flight_id).await?;

        self.savepoint().await?;
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET flight_id = $2, seat_label = $3, cabin_class = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(ticket_id.as_uuid())
        .bind(new_flight_id.as_uuid())
        .bind(new_seat.as_str())
        .bind(class.as_str())
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(StorageError::TicketNotFound(ticket_id)),
            Ok(_) => Ok(()),
            Err(err) => Err(self.write_failed(err, new_flight_id, new_seat).await),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.commit().await.map_err(map_sqlx)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.rollback().await.map_err(map_sqlx)
    }
}

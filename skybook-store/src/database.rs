use crate::app_config::DatabaseConfig;
use skybook_core::StorageError;
use skybook_shared::{FlightId, NewFlight};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Applying schema migrations");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Schema is up to date");
        Ok(())
    }

    /// Seeds a flight with every seat available.
    pub async fn insert_flight(&self, flight: &NewFlight) -> Result<FlightId, StorageError> {
        let id = FlightId::new();
        sqlx::query(
            r#"
            INSERT INTO flights (id, flight_number, origin, destination, departure_time, arrival_time,
                                 price_amount, price_currency, is_exclusive, capacity, available_seats)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&flight.flight_number)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.price_amount)
        .bind(&flight.price_currency)
        .bind(flight.is_exclusive)
        .bind(flight.capacity)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(id)
    }
}

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Classifies driver errors. Unique violations are left to callers, which
/// know which constraint they can hit.
pub(crate) fn map_sqlx(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => StorageError::Transient(err.to_string()),
        sqlx::Error::Database(db)
            if matches!(db.code().as_deref(), Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)) =>
        {
            StorageError::Transient(err.to_string())
        }
        _ => StorageError::Backend(err.to_string()),
    }
}

/// Name of the violated unique constraint, if `err` is a unique violation.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => db.constraint(),
        _ => None,
    }
}

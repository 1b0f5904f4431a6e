use skybook_booking::{BookingEngine, RetryPolicy};
use skybook_core::{
    AccountService, FlightRepository, InMemoryStore, QueryService, SeatLedger, UserRepository,
};
use skybook_store::{Config, DbClient, PgFlightRepository, PgSeatLedger, PgUserRepository};
use std::sync::Arc;
use std::time::Duration;

/// The three services a frontend talks to, sharing one storage backend.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub bookings: BookingEngine,
    pub queries: QueryService,
}

impl AppState {
    pub fn with_backends(
        ledger: Arc<dyn SeatLedger>,
        users: Arc<dyn UserRepository>,
        flights: Arc<dyn FlightRepository>,
        config: &Config,
    ) -> Self {
        let policy = RetryPolicy {
            retry_transient: config.booking.retry_transient,
        };
        Self {
            accounts: AccountService::new(users, config.auth),
            bookings: BookingEngine::new(ledger, policy),
            queries: QueryService::new(flights),
        }
    }

    pub fn postgres(db: &DbClient, config: &Config) -> Self {
        let timeout = Duration::from_millis(config.database.transaction_timeout_ms);
        Self::with_backends(
            Arc::new(PgSeatLedger::new(db.pool.clone(), timeout)),
            Arc::new(PgUserRepository::new(db.pool.clone())),
            Arc::new(PgFlightRepository::new(db.pool.clone())),
            config,
        )
    }

    pub fn in_memory(store: &InMemoryStore, config: &Config) -> Self {
        Self::with_backends(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            config,
        )
    }
}

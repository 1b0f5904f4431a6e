pub mod app_config;
pub mod database;
pub mod flight_repo;
pub mod ledger_repo;
mod rows;
pub mod user_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use flight_repo::PgFlightRepository;
pub use ledger_repo::PgSeatLedger;
pub use user_repo::PgUserRepository;

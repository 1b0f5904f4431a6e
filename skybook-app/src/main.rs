use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use skybook_app::AppState;
use skybook_core::FlightFilter;
use skybook_shared::NewFlight;
use skybook_store::{Config, DbClient};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "skybook")]
#[command(about = "Operator tooling for the SkyBook seat ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Insert flights from a JSON array, every seat available
    Seed { file: PathBuf },

    /// List flights with free seats as JSON
    Flights {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// UTC departure date, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        exclusive: bool,
    },

    /// Report flights whose seat counter disagrees with their tickets
    Audit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;

    match cli.command {
        Commands::Migrate => db.migrate().await.context("Migration failed")?,
        Commands::Seed { file } => seed(&db, &file).await?,
        Commands::Flights {
            from,
            to,
            date,
            exclusive,
        } => {
            let filter = FlightFilter {
                departure_city: from,
                arrival_city: to,
                date,
                exclusive_only: exclusive,
            };
            let state = AppState::postgres(&db, &config);
            let flights = state.queries.list_available_flights(&filter).await?;
            println!("{}", serde_json::to_string_pretty(&flights)?);
        }
        Commands::Audit => {
            let state = AppState::postgres(&db, &config);
            let unbalanced = state.queries.audit_ledger().await?;
            println!("{}", serde_json::to_string_pretty(&unbalanced)?);
            if !unbalanced.is_empty() {
                bail!("{} flight(s) out of balance", unbalanced.len());
            }
            tracing::info!("Seat ledger is balanced");
        }
    }

    Ok(())
}

async fn seed(db: &DbClient, file: &PathBuf) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let flights: Vec<NewFlight> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid flight list in {}", file.display()))?;

    for flight in &flights {
        if flight.capacity < 0 {
            bail!("Flight {} has a negative capacity", flight.flight_number);
        }
        let id = db.insert_flight(flight).await?;
        tracing::info!(flight_id = %id, "Seeded flight {}", flight.flight_number);
    }

    tracing::info!("Seeded {} flights", flights.len());
    Ok(())
}

use ledger_quest::{
    config::{database, settings},
    errors::Result,
    scheduler,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Run the daily recurrence job until the process is stopped
    info!(
        run_hour_utc = app_config.scheduler.run_hour_utc,
        "Starting recurrence scheduler"
    );
    scheduler::run_scheduler(db, app_config.scheduler).await;

    Ok(())
}

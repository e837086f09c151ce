use dotenvy::dotenv;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tiredesk::core::demand::{self, TIRE_LINES};
use tiredesk::core::{ForecastAlgorithm, backtest, compute_kpis, forecast};
use tiredesk::errors::Result;
use tiredesk::{config, db, uploads};
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

    // 2. Load .env file (as early as possible)
    dotenv().ok(); // Non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Initialize database and image store
    let db_pool = db::init_db(&app_config.database_path)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    uploads::ImageStore::new(&app_config.uploads_dir)
        .inspect_err(|e| error!("Failed to initialize image store: {}", e))?;

    // 5. Seed accounts from config.toml (idempotent)
    let arc_app_config = Arc::new(app_config);
    db::seed_accounts(&db_pool, &arc_app_config)
        .await
        .inspect_err(|e| error!("Failed to seed accounts: {}", e))?;

    // 6. Log a reporting snapshot. This stands in for the reporting screen,
    // which lives outside this crate.
    let dispatches = db::list_dispatches(&db_pool).await?;
    let complaints = db::list_for_report(&db_pool).await?;
    let summary = compute_kpis(&dispatches, &complaints);
    info!("KPI snapshot: {}", summary);

    // 7. Demo forecast per tire line over synthetic demand. Seeded so the
    // snapshot is reproducible between runs.
    let mut rng = StdRng::seed_from_u64(2024);
    for line in &TIRE_LINES {
        let history = demand::generate_monthly_demand(line, 24, 12.0, &mut rng);
        let projected = forecast(ForecastAlgorithm::SeasonalRegression, &history, 3)?;
        let metrics = backtest(ForecastAlgorithm::SeasonalRegression, &history)?;
        info!(
            "Forecast [{}]: next 3 months {:.0?} (MAPE {:.1}%)",
            line.name, projected.points, metrics.mape
        );
    }

    Ok(())
}

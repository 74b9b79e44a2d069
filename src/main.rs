use dotenvy::dotenv;
use std::{env, time::Duration};
use stock_buddy::{
    bot::{self, BotData},
    config::{database, settings, users},
    core::{product, retention, store::Store},
    errors::{Error, Result},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const SECONDS_PER_HOUR: u64 = 60 * 60;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env before anything reads the environment
    dotenv().ok();

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 3. Load settings
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    info!(
        retention_days = settings.retention_days,
        policy = ?settings.negative_stock_policy,
        "Settings loaded"
    );

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready"))?;
    let store = Store::new(db);

    // 5. Seed the catalog
    product::seed_products(&store, &settings.products).await?;

    // 6. Start the retention sweeper
    let _sweeper = retention::spawn_retention_task(
        store.clone(),
        settings.retention_days,
        Duration::from_secs(settings.sweep_interval_hours * SECONDS_PER_HOUR),
    );

    // 7. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let admins = users::get_admin_ids();
    if admins.is_empty() {
        warn!("ADMIN_USER_IDS is empty; admin commands will be unavailable");
    }

    bot::run_bot(token, BotData::new(store, settings, admins)).await
}

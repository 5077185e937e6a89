//! habit-tracker server
//!
//! Serves the Mini App API and runs the daily reminder job.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use habit_tracker::api::{create_router, AppState};
use habit_tracker::clock::Clock;
use habit_tracker::config::Config;
use habit_tracker::db::Database;
use habit_tracker::notifications;

#[derive(Parser)]
#[command(name = "habit-tracker")]
#[command(about = "Habit tracker backend for a Telegram Mini App")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "habit-tracker.toml")]
    config: PathBuf,

    /// SQLite database file (overrides config file)
    #[arg(short, long, env = "DATABASE_PATH")]
    database: Option<PathBuf>,

    /// HTTP port (overrides config file)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// JWT signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Use a built-in JWT secret when none is configured
    #[arg(long, env = "HABIT_DEV_MODE")]
    dev_mode: bool,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("habit_tracker=info".parse()?);
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting habit-tracker");
    info!("Config file: {}", cli.config.display());

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.bot_token.is_some() {
        config.telegram.bot_token = cli.bot_token;
    }
    if cli.jwt_secret.is_some() {
        config.auth.jwt_secret = cli.jwt_secret;
    }
    config.auth.dev_mode |= cli.dev_mode;
    config.validate()?;

    info!("Database: {}", config.database.path.display());
    let db = Arc::new(Database::open(&config.database.path)?);
    let clock = Clock::new(config.time.utc_offset_minutes);
    let state = AppState::from_config(db.clone(), &config, clock.clone())?;

    if config.notifications.enabled {
        tokio::spawn(notifications::run_scheduler(
            db,
            clock,
            config.telegram.clone(),
            config.notifications.clone(),
        ));
    } else {
        info!("Reminders are disabled");
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

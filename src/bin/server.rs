use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

use storefront::config::{config_file_path, get_config, CliArgs};
use storefront::state::AppState;
use storefront::{create_app, db, logging, run_migrations, seed};

/// Periodically drops expired sessions and stale rate limiter entries
fn spawn_purge_task(state: Arc<AppState>) {
    let period = state.config.purge_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            state.purge_expired();
            debug!(sessions = state.sessions.len(), "Purged expired state");
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let config = get_config(&args).map_err(anyhow::Error::msg)?;
    let _log_guard = logging::init_logging(args.debug, config.log_json, config.log_dir.as_deref());
    config.log_summary(config_file_path(&args).as_deref());
    config.validate()?;

    // Initialize the database pool
    let pool = db::init_pool(&config.database_url)?;
    {
        let mut conn = pool.get().context("Failed to get a database connection")?;
        run_migrations(&mut conn)?;
    }

    if let Some(path) = &config.seed_file {
        let data = seed::load_seed_file(path)?;
        seed::apply_seed(&pool, &data)?;
    }

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;

    let state = Arc::new(AppState::new(pool, config));
    spawn_purge_task(state.clone());

    let app = create_app(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

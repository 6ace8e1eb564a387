use anyhow::Result;
use research_feed::batch::run_refresh;
use research_feed::db::{configure_connection, establish_pool, run_migrations};
use research_feed::settings::Settings;
use research_feed::utils::{log_db_error, log_db_ready, log_init, log_refresh_error};
use std::time::Duration;
use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("research_feed=info".parse()?))
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        );
    set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let settings = Settings::load()?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "feed.db".to_string());

    log_init(
        &database_url,
        settings.batch.interval_secs,
        settings.batch.workers,
    );

    let pool = establish_pool(&database_url);
    {
        let mut conn = pool.get().expect("Failed to get initial connection");
        configure_connection(&mut conn).expect("Failed to configure SQLite connection");
        if let Err(e) = run_migrations(&mut conn) {
            log_db_error(&e.to_string());
            return Err(e);
        }
    }
    log_db_ready();

    let mut interval = tokio::time::interval(Duration::from_secs(settings.batch.interval_secs));
    loop {
        interval.tick().await;
        if let Err(e) = run_refresh(pool.clone(), &settings).await {
            log_refresh_error(&e.to_string());
        }
    }
}

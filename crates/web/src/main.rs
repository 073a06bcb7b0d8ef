use std::sync::Arc;

use anyhow::Context;
use storage::{
    Database,
    cache::{AttemptCache, RedisCache},
    memory::MemoryCache,
};
use utoipa::OpenApi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use config::Config;
use features::{events, monitor, participations};
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        monitor::handlers::get_summary,
        monitor::handlers::check_participation,
        monitor::handlers::register_participation,
        events::handlers::list_events,
        events::handlers::get_current_event,
        events::handlers::get_event,
        events::handlers::create_event,
        events::handlers::update_event,
        events::handlers::delete_event,
        participations::handlers::list_participations,
        participations::handlers::get_participation,
        participations::handlers::update_participation,
        participations::handlers::delete_participation,
    ),
    components(
        schemas(
            storage::dto::event::CreateEventRequest,
            storage::dto::event::UpdateEventRequest,
            storage::dto::event::EventResponse,
            storage::dto::monitor::SummaryResponse,
            storage::dto::monitor::SummaryEvent,
            storage::dto::monitor::SummaryTest,
            storage::dto::monitor::SummaryObstacle,
            storage::dto::monitor::ParticipationBody,
            storage::dto::participation::AttemptResponse,
            storage::dto::participation::UpdateAttemptRequest,
            storage::models::TestKind,
        )
    ),
    tags(
        (name = "monitor", description = "Check and register participations during the running event"),
        (name = "events", description = "Event management"),
        (name = "participations", description = "Recorded attempts"),
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting obstacle race API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let cache: Arc<dyn AttemptCache> = match &config.redis_url {
        Some(url) => {
            let redis = RedisCache::new(url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Caching participations in Redis");
            Arc::new(redis)
        }
        None => {
            tracing::warn!("REDIS_URL not set, caching participations in process memory");
            Arc::new(MemoryCache::new())
        }
    };

    if config.debug {
        tracing::warn!("DEBUG is on: storage failure details are sent to clients");
    }

    let state = AppState::new(db, cache, config.debug);
    let app = routes::router(state);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Cinebook - a movie-ticket booking backend

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinebook::{
    api::{self, AppState},
    config::Config,
    db,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinebook=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cinebook booking system...");

    // Load configuration (file + CINEBOOK_* environment overrides)
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Build application state
    let state = AppState::new(pool, &config.auth);

    // Demo mode: seed a catalog and an admin account on an empty database
    #[cfg(feature = "demo")]
    seed_demo_data(&state).await?;

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed sample movies, shows, and an admin account (demo/Demo123!pass).
///
/// Only runs against an empty user table, so restarting a demo instance
/// does not duplicate the catalog.
#[cfg(feature = "demo")]
async fn seed_demo_data(state: &AppState) -> Result<()> {
    use chrono::{Duration, Utc};
    use cinebook::models::{CreateMovieInput, CreateShowInput, CreateUserInput};

    if state.user_repo.count().await? > 0 {
        tracing::debug!("Demo mode: database already seeded");
        return Ok(());
    }

    tracing::info!("Demo mode: seeding sample data (admin: demo/Demo123!pass)");

    // First registered user becomes the admin
    state
        .user_service
        .register(CreateUserInput {
            username: "demo".to_string(),
            email: "demo@cinebook.local".to_string(),
            password: "Demo123!pass".to_string(),
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create demo admin: {}", e))?;

    let now = Utc::now();
    let movies = [
        ("Interstellar", 169, "PG-13"),
        ("Dune: Part Two", 166, "PG-13"),
        ("The Grand Budapest Hotel", 99, "R"),
    ];

    for (i, (title, duration, rating)) in movies.iter().enumerate() {
        let movie = state
            .movie_service
            .create_movie(CreateMovieInput {
                title: title.to_string(),
                duration_minutes: *duration,
                description: None,
                rating: Some(rating.to_string()),
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed movie: {}", e))?;

        for day in 1..=2 {
            state
                .movie_service
                .create_show(
                    CreateShowInput {
                        movie_id: movie.id,
                        screen_name: format!("Screen {}", i + 1),
                        date_time: now + Duration::days(day) + Duration::hours(i as i64),
                        total_seats: 100,
                        price_cents: 1500,
                    },
                    now,
                )
                .await
                .map_err(|e| anyhow::anyhow!("Failed to seed show: {}", e))?;
        }
    }

    tracing::info!("Demo mode: sample data created");
    Ok(())
}

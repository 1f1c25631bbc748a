//! Movie service
//!
//! Catalog reads for everyone, catalog writes for administrators. Show
//! scheduling enforces the advance-notice and capacity rules and refuses to
//! double-book a screen for the same time slot.

use crate::db::repositories::{MovieRepository, ShowRepository};
use crate::models::{CreateMovieInput, CreateShowInput, Movie, Show};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for movie/show catalog operations
#[derive(Debug, thiserror::Error)]
pub enum MovieServiceError {
    /// Referenced movie absent
    #[error("{0}")]
    NotFound(String),

    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// Screen already scheduled for the slot
    #[error("{0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Movie and show catalog service
pub struct MovieService {
    movie_repo: Arc<dyn MovieRepository>,
    show_repo: Arc<dyn ShowRepository>,
}

impl MovieService {
    /// Create a new movie service
    pub fn new(movie_repo: Arc<dyn MovieRepository>, show_repo: Arc<dyn ShowRepository>) -> Self {
        Self {
            movie_repo,
            show_repo,
        }
    }

    /// List all movies, ordered by title
    pub async fn list_movies(&self) -> Result<Vec<Movie>, MovieServiceError> {
        Ok(self
            .movie_repo
            .list()
            .await
            .context("Failed to list movies")?)
    }

    /// List upcoming active shows for a movie, soonest first
    pub async fn shows_for_movie(
        &self,
        movie_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Show>, MovieServiceError> {
        if !self
            .movie_repo
            .exists(movie_id)
            .await
            .context("Failed to check movie")?
        {
            return Err(MovieServiceError::NotFound("Movie not found".to_string()));
        }

        Ok(self
            .show_repo
            .list_future_by_movie(movie_id, now)
            .await
            .context("Failed to list shows")?)
    }

    /// Add a movie to the catalog (admin)
    pub async fn create_movie(&self, input: CreateMovieInput) -> Result<Movie, MovieServiceError> {
        input.validate().map_err(MovieServiceError::Validation)?;

        let movie = self
            .movie_repo
            .create(&input)
            .await
            .context("Failed to create movie")?;

        tracing::info!(movie_id = movie.id, title = %movie.title, "Movie created");

        Ok(movie)
    }

    /// Schedule a show (admin).
    ///
    /// Rejects unknown movies, invalid scheduling input, and screen/time
    /// collisions.
    pub async fn create_show(
        &self,
        input: CreateShowInput,
        now: DateTime<Utc>,
    ) -> Result<Show, MovieServiceError> {
        input.validate(now).map_err(MovieServiceError::Validation)?;

        if !self
            .movie_repo
            .exists(input.movie_id)
            .await
            .context("Failed to check movie")?
        {
            return Err(MovieServiceError::NotFound("Movie not found".to_string()));
        }

        if self
            .show_repo
            .find_by_screen_and_time(&input.screen_name, input.date_time)
            .await
            .context("Failed to check screen slot")?
            .is_some()
        {
            return Err(MovieServiceError::Conflict(
                "Screen is already scheduled at that time".to_string(),
            ));
        }

        let show = self
            .show_repo
            .create(&input)
            .await
            .context("Failed to create show")?;

        tracing::info!(
            show_id = show.id,
            movie_id = show.movie_id,
            screen = %show.screen_name,
            "Show scheduled"
        );

        Ok(show)
    }
}

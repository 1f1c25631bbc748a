//! Movie model
//!
//! Movies are catalog entries. They carry no lifecycle beyond existence and
//! are only changed through admin endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum allowed title length
pub const MAX_TITLE_LEN: usize = 200;

/// Runtime bounds in minutes
pub const MIN_DURATION_MINUTES: i64 = 1;
pub const MAX_DURATION_MINUTES: i64 = 600;

/// Movie entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    /// Unique identifier
    pub id: i64,
    /// Movie title
    pub title: String,
    /// Runtime in minutes
    pub duration_minutes: i64,
    /// Optional synopsis
    pub description: Option<String>,
    /// Optional rating label ("PG-13", "R", ...)
    pub rating: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Movie {
    /// Human-readable runtime, e.g. "2h 15m" or "45m"
    pub fn duration_display(&self) -> String {
        let hours = self.duration_minutes / 60;
        let minutes = self.duration_minutes % 60;
        if hours > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}m", minutes)
        }
    }
}

/// Input for creating a movie
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMovieInput {
    pub title: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
}

impl CreateMovieInput {
    /// Validate catalog rules: non-blank title within length bounds, runtime
    /// within 1..=600 minutes.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty or just whitespace".to_string());
        }
        if self.title.len() > MAX_TITLE_LEN {
            return Err(format!("Title cannot exceed {} characters", MAX_TITLE_LEN));
        }
        if self.duration_minutes < MIN_DURATION_MINUTES {
            return Err("Duration must be at least 1 minute".to_string());
        }
        if self.duration_minutes > MAX_DURATION_MINUTES {
            return Err("Duration cannot exceed 10 hours".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(duration_minutes: i64) -> Movie {
        Movie {
            id: 1,
            title: "Interstellar".to_string(),
            duration_minutes,
            description: None,
            rating: Some("PG-13".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_duration_display_with_hours() {
        assert_eq!(movie(169).duration_display(), "2h 49m");
    }

    #[test]
    fn test_duration_display_minutes_only() {
        assert_eq!(movie(45).duration_display(), "45m");
    }

    #[test]
    fn test_validate_ok() {
        let input = CreateMovieInput {
            title: "Dune".to_string(),
            duration_minutes: 155,
            description: None,
            rating: None,
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_blank_title() {
        let input = CreateMovieInput {
            title: "   ".to_string(),
            duration_minutes: 120,
            description: None,
            rating: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_validate_duration_bounds() {
        let too_short = CreateMovieInput {
            title: "Short".to_string(),
            duration_minutes: 0,
            description: None,
            rating: None,
        };
        let too_long = CreateMovieInput {
            title: "Long".to_string(),
            duration_minutes: 601,
            description: None,
            rating: None,
        };
        assert!(too_short.validate().is_err());
        assert!(too_long.validate().is_err());
    }
}

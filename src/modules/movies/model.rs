use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Movie record. `release_date` carries date-only semantics: it is always
/// truncated to the start of the day on write.
#[derive(Debug, Clone, FromRow)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub release_date: NaiveDateTime,
    pub description: String,
    pub duration: i32,
    pub budget: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub rating: Option<f64>,
    pub status: Option<String>,
    pub vote_count: Option<i32>,
    pub vote_average: Option<f64>,
    pub trailer_url: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub reminder_sent: bool,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Movie joined with its owner's public columns.
#[derive(Debug, Clone, FromRow)]
pub struct MovieWithOwner {
    #[sqlx(flatten)]
    pub movie: Movie,
    pub owner_name: String,
    pub owner_email: String,
}

/// Row selected by the reminder engine: just enough to send and mark.
#[derive(Debug, Clone, FromRow)]
pub struct DueReminder {
    pub id: String,
    pub title: String,
    pub release_date: NaiveDateTime,
    pub owner_email: String,
}

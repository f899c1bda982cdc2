use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::MovieWithOwner;

// =============================================================================
// LIST
// =============================================================================

/// Query parameters for GET /movies. Exact `duration` wins over the
/// min/max range; exact `releaseDate` wins over startDate/endDate.
#[derive(Debug, Deserialize, Validate, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListMoviesQuery {
    #[validate(range(min = 1, message = "Page must be a positive number"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub genre: Option<String>,
    #[validate(range(min = 1, message = "Duration must be a positive number"))]
    pub duration: Option<i32>,
    #[validate(range(min = 1, message = "Duration must be a positive number"))]
    pub min_duration: Option<i32>,
    #[validate(range(min = 1, message = "Duration must be a positive number"))]
    pub max_duration: Option<i32>,
    pub release_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct ListMoviesResponse {
    pub movies: Vec<MovieResponse>,
    pub pagination: PaginationMeta,
}

// =============================================================================
// MOVIE PROJECTION
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
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
    pub owner: OwnerResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MovieWithOwner> for MovieResponse {
    fn from(row: MovieWithOwner) -> Self {
        let m = row.movie;
        Self {
            id: m.id,
            title: m.title,
            original_title: m.original_title,
            release_date: m.release_date,
            description: m.description,
            duration: m.duration,
            budget: m.budget,
            revenue: m.revenue,
            genre: m.genre,
            director: m.director,
            cast: m.cast,
            rating: m.rating,
            status: m.status,
            vote_count: m.vote_count,
            vote_average: m.vote_average,
            trailer_url: m.trailer_url,
            poster_url: m.poster_url,
            backdrop_url: m.backdrop_url,
            reminder_sent: m.reminder_sent,
            owner: OwnerResponse {
                id: m.user_id,
                name: row.owner_name,
                email: row.owner_email,
            },
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

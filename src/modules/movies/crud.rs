use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use sqlx::{MySql, Pool, QueryBuilder};

use super::form::{start_of_day, FieldUpdate, UpdateMovieData};
use super::model::{DueReminder, Movie, MovieWithOwner};
use super::schema::ListMoviesQuery;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub struct MovieCrud {
    pool: Pool<MySql>,
}

impl MovieCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, movie: &Movie) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO movies (id, title, original_title, release_date, description, duration,
                budget, revenue, genre, director, `cast`, rating, status, vote_count, vote_average,
                trailer_url, poster_url, backdrop_url, reminder_sent, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&movie.id)
        .bind(&movie.title)
        .bind(&movie.original_title)
        .bind(movie.release_date)
        .bind(&movie.description)
        .bind(movie.duration)
        .bind(movie.budget)
        .bind(movie.revenue)
        .bind(&movie.genre)
        .bind(&movie.director)
        .bind(&movie.cast)
        .bind(movie.rating)
        .bind(&movie.status)
        .bind(movie.vote_count)
        .bind(movie.vote_average)
        .bind(&movie.trailer_url)
        .bind(&movie.poster_url)
        .bind(&movie.backdrop_url)
        .bind(movie.reminder_sent)
        .bind(&movie.user_id)
        .bind(movie.created_at)
        .bind(movie.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_with_owner(&self, id: &str) -> Result<Option<MovieWithOwner>, sqlx::Error> {
        sqlx::query_as::<_, MovieWithOwner>(
            r#"
            SELECT m.*, u.name AS owner_name, u.email AS owner_email
            FROM movies m
            JOIN users u ON u.id = m.user_id
            WHERE m.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Count and page queries run through the same filter builder so the
    /// pagination total always matches the page contents.
    pub async fn list(
        &self,
        query: &ListMoviesQuery,
    ) -> Result<(Vec<MovieWithOwner>, i64), sqlx::Error> {
        let page = i64::from(query.page.unwrap_or(1));
        let limit = i64::from(query.limit.unwrap_or(DEFAULT_PAGE_SIZE));
        let offset = (page - 1) * limit;

        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM movies m");
        push_filters(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::new(
            "SELECT m.*, u.name AS owner_name, u.email AS owner_email \
             FROM movies m JOIN users u ON u.id = m.user_id",
        );
        push_filters(&mut qb, query);
        qb.push(" ORDER BY m.release_date DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<MovieWithOwner>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Applies only the fields marked changed; `poster_url`/`backdrop_url`
    /// are passed separately once the blob swap has happened.
    pub async fn update(
        &self,
        id: &str,
        data: &UpdateMovieData,
        poster_url: Option<&str>,
        backdrop_url: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let mut qb = QueryBuilder::new("UPDATE movies SET updated_at = ");
        qb.push_bind(Utc::now());

        push_replace(&mut qb, "title", &data.title);
        push_replace(&mut qb, "original_title", &data.original_title);
        push_replace(&mut qb, "release_date", &data.release_date);
        push_replace(&mut qb, "description", &data.description);
        push_replace(&mut qb, "duration", &data.duration);
        push_tri(&mut qb, "budget", &data.budget);
        push_tri(&mut qb, "revenue", &data.revenue);
        push_tri(&mut qb, "genre", &data.genre);
        push_tri(&mut qb, "director", &data.director);
        push_tri(&mut qb, "`cast`", &data.cast);
        push_tri(&mut qb, "rating", &data.rating);
        push_tri(&mut qb, "status", &data.status);
        push_tri(&mut qb, "vote_count", &data.vote_count);
        push_tri(&mut qb, "vote_average", &data.vote_average);
        push_tri(&mut qb, "trailer_url", &data.trailer_url);

        if let Some(url) = poster_url {
            qb.push(", poster_url = ");
            qb.push_bind(url.to_string());
        }
        if let Some(url) = backdrop_url {
            qb.push(", backdrop_url = ");
            qb.push_bind(url.to_string());
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());

        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // REMINDERS
    // =========================================================================

    /// Movies releasing inside `[window_start, window_end)` whose owner has
    /// not been reminded yet.
    pub async fn due_reminders(
        &self,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> Result<Vec<DueReminder>, sqlx::Error> {
        sqlx::query_as::<_, DueReminder>(
            r#"
            SELECT m.id, m.title, m.release_date, u.email AS owner_email
            FROM movies m
            JOIN users u ON u.id = m.user_id
            WHERE m.release_date >= ? AND m.release_date < ? AND m.reminder_sent = FALSE
            ORDER BY m.release_date
            "#,
        )
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn mark_reminder_sent(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE movies SET reminder_sent = TRUE, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// FILTER BUILDER
// =============================================================================

fn push_filters(qb: &mut QueryBuilder<'_, MySql>, q: &ListMoviesQuery) {
    qb.push(" WHERE 1=1");

    if let Some(search) = non_empty(&q.search) {
        let pattern = format!("%{}%", search.to_lowercase());
        qb.push(" AND (LOWER(m.title) LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR LOWER(m.original_title) LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR LOWER(m.description) LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(genre) = non_empty(&q.genre) {
        qb.push(" AND LOWER(m.genre) LIKE ");
        qb.push_bind(format!("%{}%", genre.to_lowercase()));
    }

    // An exact duration takes precedence over the range form
    if let Some(duration) = q.duration {
        qb.push(" AND m.duration = ");
        qb.push_bind(duration);
    } else {
        if let Some(min) = q.min_duration {
            qb.push(" AND m.duration >= ");
            qb.push_bind(min);
        }
        if let Some(max) = q.max_duration {
            qb.push(" AND m.duration <= ");
            qb.push_bind(max);
        }
    }

    // An exact day takes precedence over the start/end range
    if let Some(day) = q.release_date {
        qb.push(" AND m.release_date >= ");
        qb.push_bind(start_of_day(day));
        qb.push(" AND m.release_date < ");
        qb.push_bind(start_of_day(next_day(day)));
    } else {
        if let Some(start) = q.start_date {
            qb.push(" AND m.release_date >= ");
            qb.push_bind(start_of_day(start));
        }
        if let Some(end) = q.end_date {
            qb.push(" AND m.release_date <= ");
            qb.push_bind(start_of_day(end));
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn next_day(day: NaiveDate) -> NaiveDate {
    day + Duration::days(1)
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

// =============================================================================
// UPDATE HELPERS
// =============================================================================

fn push_replace<'args, T>(
    qb: &mut QueryBuilder<'args, MySql>,
    column: &str,
    value: &Option<T>,
) where
    T: sqlx::Encode<'args, MySql> + sqlx::Type<MySql> + Clone + Send + 'args,
{
    if let Some(v) = value {
        qb.push(", ");
        qb.push(column);
        qb.push(" = ");
        qb.push_bind(v.clone());
    }
}

fn push_tri<'args, T>(
    qb: &mut QueryBuilder<'args, MySql>,
    column: &str,
    value: &FieldUpdate<T>,
) where
    T: sqlx::Encode<'args, MySql> + sqlx::Type<MySql> + Clone + Send + 'args,
{
    match value {
        FieldUpdate::Set(v) => {
            qb.push(", ");
            qb.push(column);
            qb.push(" = ");
            qb.push_bind(v.clone());
        }
        FieldUpdate::Clear => {
            qb.push(", ");
            qb.push(column);
            qb.push(" = NULL");
        }
        FieldUpdate::Unchanged => {}
    }
}

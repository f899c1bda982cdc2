use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::modules::auth::{schema::ErrorResponse, AuthUser};
use crate::modules::movies::{
    crud::{total_pages, MovieCrud, DEFAULT_PAGE_SIZE},
    form::{self, FormError, UploadedImage},
    model::Movie,
    schema::{ListMoviesQuery, ListMoviesResponse, MovieResponse, PaginationMeta},
};
use crate::AppState;

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
}

fn validation(e: FormError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::with_message("Validation error", e.to_string())),
    )
}

fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Movie not found")),
    )
}

// =============================================================================
// GET /movies - Filtered, paginated listing
// =============================================================================

pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListMoviesQuery>,
) -> Result<Json<ListMoviesResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = query.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let crud = MovieCrud::new(state.db.clone());
    let (rows, total) = crud.list(&query).await.map_err(internal)?;

    let page = i64::from(query.page.unwrap_or(1));
    let limit = i64::from(query.limit.unwrap_or(DEFAULT_PAGE_SIZE));

    Ok(Json(ListMoviesResponse {
        movies: rows.into_iter().map(MovieResponse::from).collect(),
        pagination: PaginationMeta {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        },
    }))
}

// =============================================================================
// GET /movies/{id}
// =============================================================================

pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MovieResponse>, (StatusCode, Json<ErrorResponse>)> {
    let crud = MovieCrud::new(state.db.clone());

    let row = crud
        .find_with_owner(&id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    Ok(Json(MovieResponse::from(row)))
}

// =============================================================================
// POST /movies - Multipart create with optional images
// =============================================================================

pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MovieResponse>), (StatusCode, Json<ErrorResponse>)> {
    let form = form::read_multipart(multipart).await.map_err(validation)?;
    let data = form::parse_create(&form.fields).map_err(validation)?;

    let poster_url = upload_if_present(&state, "posters", form.poster).await?;
    let backdrop_url = match upload_if_present(&state, "backdrops", form.backdrop).await {
        Ok(url) => url,
        Err(e) => {
            // Don't leave the first blob behind when the second upload dies
            cleanup_blobs(&state, &[poster_url.clone()]).await;
            return Err(e);
        }
    };

    let now = Utc::now();
    let movie = Movie {
        id: Uuid::new_v4().to_string(),
        title: data.title,
        original_title: data.original_title,
        release_date: data.release_date,
        description: data.description,
        duration: data.duration,
        budget: data.budget,
        revenue: data.revenue,
        genre: data.genre,
        director: data.director,
        cast: data.cast,
        rating: data.rating,
        status: data.status,
        vote_count: data.vote_count,
        vote_average: data.vote_average,
        trailer_url: data.trailer_url,
        poster_url: poster_url.clone(),
        backdrop_url: backdrop_url.clone(),
        reminder_sent: false,
        user_id: auth.id.clone(),
        created_at: now,
        updated_at: now,
    };

    let crud = MovieCrud::new(state.db.clone());
    if let Err(e) = crud.insert(&movie).await {
        cleanup_blobs(&state, &[poster_url.clone(), backdrop_url.clone()]).await;
        return Err(internal(e));
    }

    let row = crud
        .find_with_owner(&movie.id)
        .await
        .map_err(internal)?
        .ok_or_else(|| internal("created movie vanished"))?;

    tracing::info!("movie {} created by user {}", movie.id, auth.id);
    Ok((StatusCode::CREATED, Json(MovieResponse::from(row))))
}

// =============================================================================
// PUT /movies/{id} - Multipart partial update, owner only
// =============================================================================

pub async fn update(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<MovieResponse>, (StatusCode, Json<ErrorResponse>)> {
    let crud = MovieCrud::new(state.db.clone());

    let movie = crud
        .find_by_id(&id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    if movie.user_id != auth.id {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "You do not have permission to update this movie",
            )),
        ));
    }

    let form = form::read_multipart(multipart).await.map_err(validation)?;
    let data = form::parse_update(&form.fields).map_err(validation)?;

    let new_poster = swap_image(&state, "posters", form.poster, movie.poster_url.clone()).await?;
    let new_backdrop =
        swap_image(&state, "backdrops", form.backdrop, movie.backdrop_url.clone()).await?;

    crud.update(&id, &data, new_poster.as_deref(), new_backdrop.as_deref())
        .await
        .map_err(internal)?;

    let row = crud
        .find_with_owner(&id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    Ok(Json(MovieResponse::from(row)))
}

// =============================================================================
// DELETE /movies/{id} - Owner only; blobs go best-effort first
// =============================================================================

pub async fn remove(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let crud = MovieCrud::new(state.db.clone());

    let movie = crud
        .find_by_id(&id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    if movie.user_id != auth.id {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "You do not have permission to delete this movie",
            )),
        ));
    }

    cleanup_blobs(
        &state,
        &[movie.poster_url.clone(), movie.backdrop_url.clone()],
    )
    .await;

    crud.delete(&id).await.map_err(internal)?;

    tracing::info!("movie {} deleted by user {}", id, auth.id);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// IMAGE HELPERS
// =============================================================================

async fn upload_if_present(
    state: &AppState,
    prefix: &str,
    image: Option<UploadedImage>,
) -> Result<Option<String>, (StatusCode, Json<ErrorResponse>)> {
    let Some(image) = image else {
        return Ok(None);
    };

    let key = format!("{}/{}.{}", prefix, Uuid::new_v4(), image.ext);
    let url = state
        .storage
        .upload(&key, image.bytes.clone(), &image.content_type)
        .await
        .map_err(internal)?;

    Ok(Some(url))
}

/// Replace a stored image: delete the previous blob (best-effort), upload
/// the new one. Returns the new URL, or None when nothing was sent.
async fn swap_image(
    state: &AppState,
    prefix: &str,
    image: Option<UploadedImage>,
    previous_url: Option<String>,
) -> Result<Option<String>, (StatusCode, Json<ErrorResponse>)> {
    if image.is_some() {
        if let Some(old) = previous_url {
            if let Err(e) = state.storage.delete(&old).await {
                tracing::warn!("failed to delete replaced blob {}: {}", old, e);
            }
        }
    }
    upload_if_present(state, prefix, image).await
}

/// Blob deletion never blocks the surrounding operation; failures are
/// logged with the object URL for later reconciliation.
async fn cleanup_blobs(state: &AppState, urls: &[Option<String>]) {
    for url in urls.iter().flatten() {
        if let Err(e) = state.storage.delete(url).await {
            tracing::warn!("failed to delete blob {}: {}", url, e);
        }
    }
}

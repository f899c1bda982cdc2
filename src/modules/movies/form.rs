use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

// =============================================================================
// FORM ERROR
// =============================================================================

/// Field-level validation failure; always maps to a 400.
#[derive(Debug, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FormError {
    pub field: String,
    pub message: String,
}

impl FormError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// =============================================================================
// FIELD UPDATE
// =============================================================================

/// Explicit per-field update state. A field absent from the form is
/// `Unchanged`; present but empty is `Clear`; present with a value is `Set`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate<T> {
    Unchanged,
    Set(T),
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Unchanged
    }
}

// =============================================================================
// MULTIPART READING
// =============================================================================

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub ext: &'static str,
}

fn ext_from_mime(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct MovieForm {
    pub fields: HashMap<String, String>,
    pub poster: Option<UploadedImage>,
    pub backdrop: Option<UploadedImage>,
}

/// Drain a multipart body into text fields plus the two optional image
/// parts. Only JPEG, PNG and WebP are accepted, capped at 5 MiB each.
pub async fn read_multipart(mut multipart: Multipart) -> Result<MovieForm, FormError> {
    let mut form = MovieForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FormError::new("body", e.to_string()))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };

        if name == "poster" || name == "backdrop" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let ext = ext_from_mime(&content_type).ok_or_else(|| {
                FormError::new(&name, "Invalid file type. Only JPEG, PNG and WebP are allowed")
            })?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| FormError::new(&name, e.to_string()))?;
            if bytes.len() > MAX_IMAGE_BYTES {
                return Err(FormError::new(&name, "File too large (max 5MB)"));
            }
            // An empty file part means the client sent no image
            if bytes.is_empty() {
                continue;
            }
            let image = UploadedImage {
                bytes,
                content_type,
                ext,
            };
            if name == "poster" {
                form.poster = Some(image);
            } else {
                form.backdrop = Some(image);
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| FormError::new(&name, e.to_string()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

// =============================================================================
// CREATE
// =============================================================================

#[derive(Debug, Clone)]
pub struct CreateMovieData {
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
}

pub fn parse_create(fields: &HashMap<String, String>) -> Result<CreateMovieData, FormError> {
    Ok(CreateMovieData {
        title: required_text(fields, "title")?,
        original_title: required_text(fields, "originalTitle")?,
        release_date: parse_release_date(&required_text(fields, "releaseDate")?)
            .map_err(|m| FormError::new("releaseDate", m))?,
        description: {
            let d = required_text(fields, "description")?;
            if d.chars().count() < 10 {
                return Err(FormError::new(
                    "description",
                    "Description must be at least 10 characters",
                ));
            }
            d
        },
        duration: parse_duration(&required_text(fields, "duration")?)
            .map_err(|m| FormError::new("duration", m))?,
        budget: optional(fields, "budget", parse_decimal)?,
        revenue: optional(fields, "revenue", parse_decimal)?,
        genre: optional(fields, "genre", plain_text)?,
        director: optional(fields, "director", plain_text)?,
        cast: optional(fields, "cast", plain_text)?,
        rating: optional(fields, "rating", parse_score)?,
        status: optional(fields, "status", plain_text)?,
        vote_count: optional(fields, "voteCount", parse_vote_count)?,
        vote_average: optional(fields, "voteAverage", parse_score)?,
        trailer_url: optional(fields, "trailerUrl", parse_url)?,
    })
}

// =============================================================================
// UPDATE
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct UpdateMovieData {
    // Required columns: can be replaced but never cleared
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub release_date: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub duration: Option<i32>,
    // Optional columns: tri-state
    pub budget: FieldUpdate<Decimal>,
    pub revenue: FieldUpdate<Decimal>,
    pub genre: FieldUpdate<String>,
    pub director: FieldUpdate<String>,
    pub cast: FieldUpdate<String>,
    pub rating: FieldUpdate<f64>,
    pub status: FieldUpdate<String>,
    pub vote_count: FieldUpdate<i32>,
    pub vote_average: FieldUpdate<f64>,
    pub trailer_url: FieldUpdate<String>,
}

pub fn parse_update(fields: &HashMap<String, String>) -> Result<UpdateMovieData, FormError> {
    Ok(UpdateMovieData {
        title: replaceable(fields, "title", plain_text)?,
        original_title: replaceable(fields, "originalTitle", plain_text)?,
        release_date: replaceable(fields, "releaseDate", |raw| parse_release_date(raw))?,
        description: replaceable(fields, "description", |raw| {
            if raw.chars().count() < 10 {
                Err("Description must be at least 10 characters".into())
            } else {
                Ok(raw.to_string())
            }
        })?,
        duration: replaceable(fields, "duration", parse_duration)?,
        budget: tri_state(fields, "budget", parse_decimal)?,
        revenue: tri_state(fields, "revenue", parse_decimal)?,
        genre: tri_state(fields, "genre", plain_text)?,
        director: tri_state(fields, "director", plain_text)?,
        cast: tri_state(fields, "cast", plain_text)?,
        rating: tri_state(fields, "rating", parse_score)?,
        status: tri_state(fields, "status", plain_text)?,
        vote_count: tri_state(fields, "voteCount", parse_vote_count)?,
        vote_average: tri_state(fields, "voteAverage", parse_score)?,
        trailer_url: tri_state(fields, "trailerUrl", parse_url)?,
    })
}

// =============================================================================
// FIELD PARSERS
// =============================================================================

fn required_text(fields: &HashMap<String, String>, name: &str) -> Result<String, FormError> {
    match fields.get(name).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(FormError::new(name, format!("{} is required", name))),
    }
}

/// Required column in an update: absent means unchanged, empty is an error.
fn replaceable<T>(
    fields: &HashMap<String, String>,
    name: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, FormError> {
    match fields.get(name).map(|v| v.trim()) {
        None => Ok(None),
        Some("") => Err(FormError::new(name, format!("{} cannot be empty", name))),
        Some(v) => parse(v).map(Some).map_err(|m| FormError::new(name, m)),
    }
}

/// Optional column in a create: absent and empty both mean "no value".
fn optional<T>(
    fields: &HashMap<String, String>,
    name: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, FormError> {
    match fields.get(name).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(v) => parse(v).map(Some).map_err(|m| FormError::new(name, m)),
    }
}

/// Optional column in an update: absent = unchanged, empty = cleared.
fn tri_state<T>(
    fields: &HashMap<String, String>,
    name: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<FieldUpdate<T>, FormError> {
    match fields.get(name).map(|v| v.trim()) {
        None => Ok(FieldUpdate::Unchanged),
        Some("") => Ok(FieldUpdate::Clear),
        Some(v) => parse(v)
            .map(FieldUpdate::Set)
            .map_err(|m| FormError::new(name, m)),
    }
}

fn plain_text(raw: &str) -> Result<String, String> {
    Ok(raw.to_string())
}

/// Accepts a bare date or an RFC 3339 timestamp; either way the stored
/// value is truncated to the start of the day.
fn parse_release_date(raw: &str) -> Result<NaiveDateTime, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(start_of_day(dt.date_naive()));
    }
    Err("Invalid date format".into())
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
}

fn parse_duration(raw: &str) -> Result<i32, String> {
    match raw.parse::<i32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err("Duration must be a positive number".into()),
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|_| "Invalid number".into())
}

fn parse_score(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if (0.0..=10.0).contains(&v) => Ok(v),
        _ => Err("Must be a number between 0 and 10".into()),
    }
}

fn parse_vote_count(raw: &str) -> Result<i32, String> {
    match raw.parse::<i32>() {
        Ok(v) if v >= 0 => Ok(v),
        _ => Err("Must be a non-negative integer".into()),
    }
}

fn parse_url(raw: &str) -> Result<String, String> {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Ok(raw.to_string())
    } else {
        Err("Invalid URL format".into())
    }
}

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::AppError, geo::GeoPoint};

/// Coordinate stored when an upload carries neither `origin` nor `lat`/`lng`.
pub const DEFAULT_COORDINATE: f64 = -1.0;

pub const MEDIA_TYPE_JPEG: &str = "image/jpeg";
pub const MEDIA_TYPE_PNG: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "image_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageType {
    Jpeg,
    Png,
}

impl ImageType {
    /// Maps a declared content type onto the stored image type. Parameters
    /// after `;` are ignored. Only the two media types the upload endpoint
    /// accepts are recognised.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            MEDIA_TYPE_JPEG => Some(ImageType::Jpeg),
            MEDIA_TYPE_PNG => Some(ImageType::Png),
            _ => None,
        }
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRecord {
    /// Keyset cursor position inside the store.
    pub seq: i64,
    pub id: Uuid,
    pub image: Vec<u8>,
    pub image_type: ImageType,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

/// A record that passed assembly and is ready for a single insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImageRecord {
    pub image: Vec<u8>,
    pub image_type: ImageType,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

impl NewImageRecord {
    /// Shapes an upload into a record.
    ///
    /// Checks run in order: size ceiling, empty body, media type, then
    /// coordinates. `origin` wins over `lat`/`lng` whenever it is present.
    pub fn assemble(
        image: Vec<u8>,
        media_type: &str,
        params: UploadParams,
        max_bytes: usize,
    ) -> Result<Self, AppError> {
        if image.len() > max_bytes {
            return Err(AppError::PayloadTooLarge { size: image.len(), limit: max_bytes });
        }
        if image.is_empty() {
            return Err(AppError::MalformedPayload("image body is empty".to_string()));
        }

        let image_type = ImageType::from_media_type(media_type).ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "'{}', expected {} or {}",
                media_type, MEDIA_TYPE_JPEG, MEDIA_TYPE_PNG
            ))
        })?;

        let location = params.location()?;

        Ok(NewImageRecord {
            image,
            image_type,
            latitude: location.latitude,
            longitude: location.longitude,
            timestamp: params.timestamp,
        })
    }
}

// ───── API Request Models ──────────────────────────────────────────

/// Query string of an upload: `?lat=&lng=&origin=&timestamp=`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub origin: Option<String>,
    pub timestamp: i64,
}

impl UploadParams {
    /// Resolves the single coordinate pair of the upload.
    pub fn location(&self) -> Result<GeoPoint, AppError> {
        match unset_to_none(self.origin.as_deref()) {
            Some(origin) => GeoPoint::parse(origin)
                .map_err(|e| AppError::MalformedCoordinate(format!("origin '{}': {}", origin, e))),
            None => Ok(GeoPoint::new(
                self.lat.unwrap_or(DEFAULT_COORDINATE),
                self.lng.unwrap_or(DEFAULT_COORDINATE),
            )),
        }
    }
}

/// Older clients send `unset` or `-1` to mean "not supplied".
pub fn unset_to_none(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && *v != "unset" && *v != "-1")
}

// ───── API Response Models ──────────────────────────────────────────

/// Outbound shape of a stored record. `image` and `imageType` are left out
/// of the JSON entirely when the caller opts out of payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<ImageType>,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn project(self, include_image: bool) -> ImageResponse {
        let (image, image_type) = if include_image {
            (Some(STANDARD.encode(&self.image)), Some(self.image_type))
        } else {
            (None, None)
        };

        ImageResponse {
            id: self.id,
            image,
            image_type,
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp: self.timestamp,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageCreatedResponse {
    pub id: Uuid,
    pub message: String,
}

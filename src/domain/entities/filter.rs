use serde::Deserialize;

use crate::{
    entities::image::unset_to_none,
    errors::AppError,
    geo::GeoFilter,
};

/// Wire value of `radius` meaning "no radius".
const UNSET_RADIUS: f64 = -1.0;

fn default_include_image() -> bool {
    true
}

/// Query string of a listing: `?includeImage=&bounds=&radius=`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageQuery {
    #[serde(default = "default_include_image")]
    pub include_image: bool,
    #[serde(default)]
    pub bounds: Option<String>,
    #[serde(default)]
    pub radius: Option<f64>,
}

impl Default for ImageQuery {
    fn default() -> Self {
        ImageQuery {
            include_image: default_include_image(),
            bounds: None,
            radius: None,
        }
    }
}

/// Filter and projection options for one listing call.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFilterRequest {
    pub include_image: bool,
    pub bounds: Option<String>,
    pub radius: Option<f64>,
}

impl From<ImageQuery> for GeoFilterRequest {
    fn from(query: ImageQuery) -> Self {
        GeoFilterRequest {
            include_image: query.include_image,
            bounds: unset_to_none(query.bounds.as_deref()).map(str::to_string),
            radius: query.radius.filter(|r| *r != UNSET_RADIUS),
        }
    }
}

impl GeoFilterRequest {
    pub fn everything(include_image: bool) -> Self {
        GeoFilterRequest { include_image, bounds: None, radius: None }
    }

    pub fn resolve(&self) -> Result<GeoFilter, AppError> {
        GeoFilter::resolve(self.bounds.as_deref(), self.radius).map_err(|e| {
            AppError::MalformedFilter(format!(
                "bounds '{}' radius {:?}: {}",
                self.bounds.as_deref().unwrap_or_default(),
                self.radius,
                e
            ))
        })
    }
}

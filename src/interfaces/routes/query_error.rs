use actix_web::web;

use crate::errors::AppError;

/// Query strings that fail to deserialize (missing `timestamp`,
/// non-numeric `radius`, ...) become `AppError::MalformedQuery`.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, req| {
        tracing::debug!(path = %req.path(), "Rejected query string: {}", err);
        AppError::from(err).into()
    }));
}

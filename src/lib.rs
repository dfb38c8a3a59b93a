use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, geo, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::db;

use repositories::{image::ImageRepository, sqlx_repo::SqlxImageRepo};
use use_cases::images::ImageHandler;
use handlers::system::HealthCache;

pub struct AppState {
    pub image_handler: AppImageHandler,
    pub health_cache: HealthCache,
}

pub type AppImageHandler = ImageHandler<Arc<dyn ImageRepository>>;

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Self {
        let image_repo = SqlxImageRepo::new(pool)
            .with_scan_batch_size(config.scan_batch_size);

        Self::with_repository(config, Arc::new(image_repo))
    }

    /// Wires the handler to any store, e.g. an in-memory one in tests.
    pub fn with_repository(config: &settings::AppConfig, image_repo: Arc<dyn ImageRepository>) -> Self {
        AppState {
            image_handler: ImageHandler::new(image_repo, config.max_image_bytes),
            health_cache: HealthCache::default(),
        }
    }
}

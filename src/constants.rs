use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// 16 MiB, the per-document ceiling of the store the service was first built on.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

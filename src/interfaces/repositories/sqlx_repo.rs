use sqlx::PgPool;

/// Rows fetched per round trip while scanning the image table.
pub const DEFAULT_SCAN_BATCH_SIZE: i64 = 100;

#[derive(Clone)]
pub struct SqlxImageRepo {
    pub pool: PgPool,
    pub scan_batch_size: i64,
}

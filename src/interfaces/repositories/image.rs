use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    entities::image::{ImageRecord, NewImageRecord},
    errors::AppError,
    repositories::sqlx_repo::{SqlxImageRepo, DEFAULT_SCAN_BATCH_SIZE},
};

/// Lazy sequence of stored records in unspecified order.
pub type ImageCursor = BoxStream<'static, Result<ImageRecord, AppError>>;

#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Persists one record and returns its id
    async fn insert(&self, image: &NewImageRecord) -> Result<Uuid, AppError>;

    /// Streams every stored record. Nothing is fetched until the cursor is polled.
    fn scan_all(&self) -> ImageCursor;

    async fn check_connection(&self) -> Result<(), AppError>;
}

#[async_trait]
impl<T> ImageRepository for Arc<T>
where
    T: ImageRepository + ?Sized,
{
    async fn insert(&self, image: &NewImageRecord) -> Result<Uuid, AppError> {
        (**self).insert(image).await
    }

    fn scan_all(&self) -> ImageCursor {
        (**self).scan_all()
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }
}

impl SqlxImageRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxImageRepo { pool, scan_batch_size: DEFAULT_SCAN_BATCH_SIZE }
    }

    pub fn with_scan_batch_size(mut self, scan_batch_size: i64) -> Self {
        self.scan_batch_size = scan_batch_size.max(1);
        self
    }
}

async fn fetch_batch(pool: &PgPool, after_seq: i64, limit: i64) -> Result<Vec<ImageRecord>, AppError> {
    let rows = sqlx::query_as::<_, ImageRecord>(
        r#"
        SELECT seq, id, image, image_type, latitude, longitude, "timestamp", created_at
        FROM images
        WHERE seq > $1
        ORDER BY seq
        LIMIT $2
        "#,
    )
    .bind(after_seq)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[async_trait]
impl ImageRepository for SqlxImageRepo {
    async fn insert(&self, image: &NewImageRecord) -> Result<Uuid, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO images (image, image_type, latitude, longitude, "timestamp")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&image.image)
        .bind(image.image_type)
        .bind(image.latitude)
        .bind(image.longitude)
        .bind(image.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    fn scan_all(&self) -> ImageCursor {
        let pool = self.pool.clone();
        let limit = self.scan_batch_size;

        // Keyset paging: resume after the last seq seen, stop on a short batch
        stream::try_unfold(Some(0_i64), move |cursor| {
            let pool = pool.clone();
            async move {
                let Some(after_seq) = cursor else {
                    return Ok::<_, AppError>(None);
                };

                let batch = fetch_batch(&pool, after_seq, limit).await?;
                let next = if (batch.len() as i64) < limit {
                    None
                } else {
                    batch.last().map(|record| record.seq)
                };

                tracing::debug!(after_seq, fetched = batch.len(), "Fetched image batch");

                let records = stream::iter(batch.into_iter().map(Ok::<_, AppError>));
                Ok(Some((records, next)))
            }
        })
        .try_flatten()
        .boxed()
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

use futures::TryStreamExt;

use crate::{
    entities::{
        filter::GeoFilterRequest,
        image::{ImageCreatedResponse, ImageResponse, NewImageRecord, UploadParams},
    },
    errors::AppError,
    geo::matches_filter,
    repositories::image::ImageRepository,
};

pub struct ImageHandler<R>
where
    R: ImageRepository,
{
    pub image_repo: R,
    pub max_image_bytes: usize,
}

impl<R> ImageHandler<R>
where
    R: ImageRepository,
{
    pub fn new(image_repo: R, max_image_bytes: usize) -> Self {
        ImageHandler { image_repo, max_image_bytes }
    }

    /// Validates an upload and stores it with exactly one insert.
    pub async fn upload_image(
        &self,
        image: Vec<u8>,
        media_type: &str,
        params: UploadParams,
    ) -> Result<ImageCreatedResponse, AppError> {
        let size = image.len();
        let record = NewImageRecord::assemble(image, media_type, params, self.max_image_bytes)
            .inspect_err(|e| tracing::warn!(size, media_type, "Rejected image upload: {}", e))?;

        let id = self.image_repo.insert(&record).await.inspect_err(|e| {
            tracing::error!(size, "Failed to store image: {}", e)
        })?;

        tracing::info!(
            %id,
            size,
            image_type = ?record.image_type,
            latitude = record.latitude,
            longitude = record.longitude,
            "Stored image"
        );

        Ok(ImageCreatedResponse {
            id,
            message: "Image stored.".to_string(),
        })
    }

    /// Streams the store and keeps records inside the requested region, in
    /// scan order. A malformed filter fails before the store is read.
    pub async fn list_images(
        &self,
        request: &GeoFilterRequest,
    ) -> Result<Vec<ImageResponse>, AppError> {
        let filter = request.resolve()?;
        let include_image = request.include_image;

        let mut scanned = 0_usize;
        let images: Vec<ImageResponse> = self
            .image_repo
            .scan_all()
            .try_filter_map(|record| {
                scanned += 1;
                let kept = matches_filter(&filter, record.latitude, record.longitude)
                    .then(|| record.project(include_image));
                futures::future::ready(Ok(kept))
            })
            .try_collect()
            .await?;

        tracing::info!(?filter, scanned, matched = images.len(), "Listed images");

        Ok(images)
    }
}

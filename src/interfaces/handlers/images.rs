use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use futures::StreamExt;
use tracing::instrument;

use crate::{
    entities::{filter::{GeoFilterRequest, ImageQuery}, image::UploadParams},
    errors::AppError,
    AppState,
};

#[instrument(skip(state, query))]
pub async fn get_images(
    state: web::Data<AppState>,
    query: web::Query<ImageQuery>,
) -> Result<impl Responder, AppError> {
    let request = GeoFilterRequest::from(query.into_inner());

    let images = state.image_handler.list_images(&request).await?;

    Ok(HttpResponse::Ok().json(images))
}

#[instrument(skip(req, state, params, payload))]
pub async fn upload_image(
    req: HttpRequest,
    state: web::Data<AppState>,
    params: web::Query<UploadParams>,
    payload: web::Payload,
) -> Result<impl Responder, AppError> {
    let media_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let max_bytes = state.image_handler.max_image_bytes;
    let body = read_body(payload, max_bytes).await?;

    let response = state
        .image_handler
        .upload_image(body, media_type, params.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(response))
}

/// Buffers the request body, stopping once it is known to exceed `max_bytes`
/// so an oversized upload is never held in memory in full. The returned
/// buffer is then at most `max_bytes + 1` long and the size check in record
/// assembly rejects it.
async fn read_body(mut payload: web::Payload, max_bytes: usize) -> Result<Vec<u8>, AppError> {
    let mut body = Vec::new();

    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::MalformedPayload(e.to_string()))?;

        let room = (max_bytes + 1).saturating_sub(body.len());
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            tracing::warn!(max_bytes, "Upload body exceeds the size limit, stopped reading");
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

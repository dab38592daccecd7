use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use log::{error, info, warn};
use std::time::Instant;

use super::models::*;
use super::state::SharedState;
use crate::error::Error;
use crate::extraction::{ExtractionRequest, RawExtractionRequest};
use crate::place::Geometry;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Maps a failure to its status; internal details stay in the log
fn error_response(err: Error) -> ApiError {
    match &err {
        Error::Validation(e) => reject(StatusCode::BAD_REQUEST, e.to_string()),
        Error::PlaceNotFound(_) => reject(StatusCode::NOT_FOUND, "Municipality not found"),
        Error::SourceNotFound(path) => {
            warn!("Source raster missing: {}", path.display());
            reject(StatusCode::NOT_FOUND, "Source raster not found for this product")
        }
        Error::ExternalTool(_) | Error::OutputMissing(_) => {
            error!("Extraction failed: {}", err);
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to extract bbox: {}", err),
            )
        }
        Error::Io(_) | Error::Projection(_) | Error::Config(_) | Error::Store(_) => {
            error!("Internal error: {}", err);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn download_bbox(
    State(state): State<SharedState>,
    payload: Result<Json<RawExtractionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let Json(raw) = payload.map_err(|e| reject(StatusCode::BAD_REQUEST, e.body_text()))?;

    info!(
        "Download request: product={} resolution={} corners=({:?}, {:?}) ({:?}, {:?})",
        raw.product, raw.resolution, raw.x1, raw.y1, raw.x2, raw.y2
    );

    let request = ExtractionRequest::build(&raw, &state.transformer)
        .map_err(|e| error_response(e.into()))?;
    let source = state
        .sources
        .resolve(request.product)
        .await
        .map_err(error_response)?;
    let bytes = state
        .extractor
        .extract(&source, &request)
        .await
        .map_err(error_response)?;

    let filename = request.download_filename();
    info!(
        "Sending {} ({:.2} KB) after {:.0} ms",
        filename,
        bytes.len() as f64 / 1024.0,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| {
            error!("Failed to build response: {}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })
}

pub async fn get_polygon(
    State(state): State<SharedState>,
    payload: Result<Json<PolygonRequest>, JsonRejection>,
) -> Result<Json<Geometry>, ApiError> {
    let Json(body) = payload.map_err(|e| reject(StatusCode::BAD_REQUEST, e.body_text()))?;
    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Name parameter is required"))?;

    let places = state.places.clone();
    let geometry = tokio::task::spawn_blocking(move || places.resolve(&name))
        .await
        .map_err(|e| {
            error!("Place lookup task failed: {}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })?
        .map_err(error_response)?;

    Ok(Json(geometry))
}

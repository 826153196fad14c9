use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;

use crate::{
    dtos::{Place, PlaceDetailsQuery, PhotoUrlQuery, PhotoUrlResponse, PlacesQuery},
    services::{
        metrics::record_upstream_call,
        places::{
            project_place, NearbySearch, DEFAULT_PHOTO_MAX_WIDTH, DEFAULT_PLACE_TYPE,
            DEFAULT_RADIUS,
        },
    },
    utils::required,
    AppState,
};

const MISSING_COORDINATES: &str = "Latitude and longitude are required";
const MISSING_PHOTO_REFERENCE: &str = "Photo reference is required";
const MISSING_PLACE_ID: &str = "Place ID is required";

/// Places-search failure: the usual error body plus an empty `places` list.
#[derive(Debug)]
pub struct SearchFailure(pub AppError);

impl From<AppError> for SearchFailure {
    fn from(err: AppError) -> Self {
        SearchFailure(err)
    }
}

impl IntoResponse for SearchFailure {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct SearchErrorBody {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<Value>,
            places: Vec<Place>,
        }

        let body = self.0.body();
        (
            self.0.status_code(),
            Json(SearchErrorBody {
                error: body.error,
                details: body.details,
                places: Vec::new(),
            }),
        )
            .into_response()
    }
}

fn query_error(rejection: QueryRejection) -> AppError {
    AppError::ValidationError(rejection.body_text())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Nearby search around `lat,lng`, projected into `Place` records.
pub async fn search_places(
    State(state): State<AppState>,
    query: Result<Query<PlacesQuery>, QueryRejection>,
) -> Result<Json<Vec<Place>>, SearchFailure> {
    let Query(query) = query.map_err(query_error)?;
    let lat = required(query.lat, MISSING_COORDINATES)?;
    let lng = required(query.lng, MISSING_COORDINATES)?;

    let search = NearbySearch {
        location: format!("{},{}", lat, lng),
        radius: non_blank(query.radius).unwrap_or_else(|| DEFAULT_RADIUS.to_string()),
        place_type: non_blank(query.place_type).unwrap_or_else(|| DEFAULT_PLACE_TYPE.to_string()),
    };

    let response = state.places.nearby_search(&search).await.map_err(|e| {
        record_upstream_call("google_places", "error");
        tracing::error!(error = %e, "Places nearby search failed");
        AppError::from(e)
    })?;

    let details = || {
        response
            .error_message
            .clone()
            .map(Value::String)
            .or_else(|| Some(response.raw.clone()))
    };

    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => {
            record_upstream_call("google_places", "success");
            let places: Vec<Place> = response.results.iter().map(project_place).collect();
            tracing::info!(count = places.len(), "Returning places");
            Ok(Json(places))
        }
        "REQUEST_DENIED" => {
            record_upstream_call("google_places", "denied");
            tracing::error!(details = ?response.error_message, "Places request denied");
            Err(AppError::UpstreamTransportError {
                status: StatusCode::FORBIDDEN,
                message: "Places API request denied".to_string(),
                details: details(),
            }
            .into())
        }
        "INVALID_REQUEST" => {
            record_upstream_call("google_places", "invalid");
            tracing::warn!(details = ?response.error_message, "Places request invalid");
            Err(AppError::UpstreamTransportError {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid request to Places API".to_string(),
                details: details(),
            }
            .into())
        }
        other => {
            record_upstream_call("google_places", "error");
            tracing::error!(status = %other, "Places API returned unexpected status");
            Err(AppError::upstream(
                format!("Places API returned status {}", other),
                Some(response.raw.clone()),
            )
            .into())
        }
    }
}

/// Builds an image URL for a photo reference without calling upstream.
pub async fn photo_url(
    State(state): State<AppState>,
    query: Result<Query<PhotoUrlQuery>, QueryRejection>,
) -> Result<Json<PhotoUrlResponse>, AppError> {
    let Query(query) = query.map_err(query_error)?;
    let photo_reference = required(query.photo_reference, MISSING_PHOTO_REFERENCE)?;

    if !state.places.is_configured() {
        tracing::warn!("Building photo URL without a Google Maps API key");
    }

    let image_url = state.places.photo_url(
        &photo_reference,
        query.max_width.unwrap_or(DEFAULT_PHOTO_MAX_WIDTH),
    );

    Ok(Json(PhotoUrlResponse { image_url }))
}

/// Returns Google's `result` object for a place, untouched.
pub async fn place_details(
    State(state): State<AppState>,
    query: Result<Query<PlaceDetailsQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query.map_err(query_error)?;
    let place_id = required(query.place_id, MISSING_PLACE_ID)?;

    let raw = state.places.place_details(&place_id).await.map_err(|e| {
        record_upstream_call("google_places", "error");
        tracing::error!(place_id = %place_id, error = %e, "Place details request failed");
        AppError::from(e)
    })?;

    match (
        raw.get("status").and_then(Value::as_str),
        raw.get("result"),
    ) {
        (Some("OK"), Some(result)) => {
            record_upstream_call("google_places", "success");
            Ok(Json(result.clone()))
        }
        (status, _) => {
            record_upstream_call("google_places", "not_found");
            tracing::warn!(place_id = %place_id, status = ?status, "Place details not found");
            Err(AppError::NotFound {
                message: "Place not found".to_string(),
                details: Some(raw.clone()),
            })
        }
    }
}

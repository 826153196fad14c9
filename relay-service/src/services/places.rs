//! Google Places client: nearby search, place details and photo URLs.
//!
//! The client reports Google's own `status` field back to the caller; mapping
//! statuses onto HTTP responses is the handlers' job.

use crate::config::GoogleMapsSettings;
use crate::dtos::{Place, PlaceLocation, Rating};
use crate::utils::first_non_empty;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use thiserror::Error;

pub const DEFAULT_PLACE_TYPE: &str = "tourist_attraction";
pub const DEFAULT_RADIUS: &str = "5000";
pub const DEFAULT_PHOTO_MAX_WIDTH: u32 = 400;
pub const ADDRESS_NOT_AVAILABLE: &str = "Address not available";

/// Fields requested from the details endpoint.
pub const DETAIL_FIELDS: &str = "name,place_id,formatted_address,formatted_phone_number,\
international_phone_number,website,url,rating,user_ratings_total,price_level,opening_hours,\
reviews,photos,geometry,types";

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("GOOGLE_MAPS_API_KEY is not set")]
    NotConfigured,

    #[error("Failed to fetch data from Google Places: {message}")]
    Transport {
        message: String,
        body: Option<Value>,
    },

    #[error("Unexpected response from Google Places: {0}")]
    UnexpectedResponse(String),
}

impl From<PlacesError> for AppError {
    fn from(err: PlacesError) -> Self {
        match err {
            PlacesError::NotConfigured => {
                AppError::ConfigurationError("Google Maps API key is not configured".to_string())
            }
            PlacesError::Transport { message, body } => AppError::upstream(
                format!("Failed to fetch data from Google Places: {}", message),
                body,
            ),
            PlacesError::UnexpectedResponse(msg) => AppError::contract(msg),
        }
    }
}

/// The URL is left out of the message: it carries the API key.
fn transport_error(err: reqwest::Error) -> PlacesError {
    PlacesError::Transport {
        message: err.without_url().to_string(),
        body: None,
    }
}

/// Arguments for a nearby search.
#[derive(Debug, Clone)]
pub struct NearbySearch {
    /// `"lat,lng"`
    pub location: String,
    pub radius: String,
    pub place_type: String,
}

/// A nearby-search answer as reported by Google.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub status: String,
    pub error_message: Option<String>,
    pub results: Vec<RawPlace>,
    /// The untouched body, kept for diagnostics.
    pub raw: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlace {
    pub name: Option<String>,
    pub vicinity: Option<String>,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub geometry: Option<Geometry>,
    pub photos: Option<Vec<RawPhoto>>,
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Geometry {
    pub location: Option<LatLng>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LatLng {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPhoto {
    pub photo_reference: Option<String>,
}

#[derive(Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<RawPlace>,
}

/// Reshapes a Google place into the relay's `Place` record. Never fails.
pub fn project_place(raw: &RawPlace) -> Place {
    let location = raw
        .geometry
        .as_ref()
        .and_then(|g| g.location)
        .unwrap_or_default();

    Place {
        name: raw.name.clone(),
        address: first_non_empty(
            [raw.vicinity.as_deref(), raw.formatted_address.as_deref()],
            ADDRESS_NOT_AVAILABLE,
        )
        .to_string(),
        rating: raw.rating.map(Rating::Score).unwrap_or(Rating::NotAvailable),
        location: PlaceLocation {
            latitude: location.lat,
            longitude: location.lng,
        },
        photos: raw
            .photos
            .as_ref()
            .and_then(|photos| photos.first())
            .and_then(|photo| photo.photo_reference.clone()),
        google_maps_uri: raw
            .place_id
            .as_ref()
            .map(|id| format!("https://www.google.com/maps/place/?q=place_id:{}", id)),
        place_id: raw.place_id.clone(),
    }
}

/// Google Places client (key-in-query-string auth).
#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    settings: GoogleMapsSettings,
}

impl PlacesClient {
    pub fn new(client: Client, settings: GoogleMapsSettings) -> Self {
        Self { client, settings }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, PlacesError> {
        let api_key = self
            .settings
            .api_key
            .as_ref()
            .ok_or(PlacesError::NotConfigured)?;

        let response = self
            .client
            .traced_get(&self.endpoint(path))
            .query(params)
            .query(&[("key", api_key.expose_secret().as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(PlacesError::Transport {
                message: format!("HTTP {}", status),
                body: Some(
                    serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone())),
                ),
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| PlacesError::UnexpectedResponse(format!("invalid JSON: {}", e)))
    }

    pub async fn nearby_search(&self, search: &NearbySearch) -> Result<SearchResponse, PlacesError> {
        tracing::info!(
            location = %search.location,
            radius = %search.radius,
            place_type = %search.place_type,
            "Calling Places nearby search"
        );

        let raw = self
            .get_json(
                "nearbysearch/json",
                &[
                    ("location", search.location.as_str()),
                    ("radius", search.radius.as_str()),
                    ("type", search.place_type.as_str()),
                ],
            )
            .await?;

        let envelope: SearchEnvelope = serde_json::from_value(raw.clone())
            .map_err(|e| PlacesError::UnexpectedResponse(e.to_string()))?;

        tracing::info!(
            status = %envelope.status,
            result_count = envelope.results.len(),
            "Places nearby search answered"
        );

        Ok(SearchResponse {
            status: envelope.status,
            error_message: envelope.error_message,
            results: envelope.results,
            raw,
        })
    }

    /// Raw details body; callers inspect `status` and `result`.
    pub async fn place_details(&self, place_id: &str) -> Result<Value, PlacesError> {
        tracing::info!(place_id = %place_id, "Calling Places details");

        self.get_json(
            "details/json",
            &[("place_id", place_id), ("fields", DETAIL_FIELDS)],
        )
        .await
    }

    /// Builds a photo URL. Pure: no request is made.
    pub fn photo_url(&self, photo_reference: &str, max_width: u32) -> String {
        let key = self
            .settings
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .unwrap_or_default();

        format!(
            "{}?maxwidth={}&photo_reference={}&key={}",
            self.endpoint("photo"),
            max_width,
            urlencoding::encode(photo_reference),
            urlencoding::encode(key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;
    use serde_json::json;

    fn raw_place(value: Value) -> RawPlace {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn projects_complete_place() {
        let place = project_place(&raw_place(json!({
            "name": "Louvre Museum",
            "vicinity": "Rue de Rivoli, Paris",
            "formatted_address": "ignored",
            "rating": 4.7,
            "geometry": { "location": { "lat": 48.8606, "lng": 2.3376 } },
            "photos": [{ "photo_reference": "ref-1" }, { "photo_reference": "ref-2" }],
            "place_id": "ChIJ123"
        })));

        assert_eq!(place.name.as_deref(), Some("Louvre Museum"));
        assert_eq!(place.address, "Rue de Rivoli, Paris");
        assert_eq!(place.rating, Rating::Score(4.7));
        assert_eq!(place.location.latitude, Some(48.8606));
        assert_eq!(place.photos.as_deref(), Some("ref-1"));
        assert_eq!(
            place.google_maps_uri.as_deref(),
            Some("https://www.google.com/maps/place/?q=place_id:ChIJ123")
        );
    }

    #[test]
    fn missing_rating_is_not_available() {
        let place = project_place(&raw_place(json!({ "name": "Park" })));
        let value = serde_json::to_value(&place).unwrap();
        assert_eq!(value["rating"], "N/A");
    }

    #[test]
    fn address_falls_back_through_candidates() {
        let formatted = project_place(&raw_place(json!({ "formatted_address": "Paris" })));
        assert_eq!(formatted.address, "Paris");

        let neither = project_place(&raw_place(json!({})));
        assert_eq!(neither.address, ADDRESS_NOT_AVAILABLE);
    }

    #[test]
    fn empty_place_projects_to_nulls() {
        let value = serde_json::to_value(project_place(&RawPlace::default())).unwrap();
        assert_eq!(value["photos"], Value::Null);
        assert_eq!(value["location"]["latitude"], Value::Null);
        assert_eq!(value["placeId"], Value::Null);
    }

    #[test]
    fn photo_url_is_deterministic() {
        let client = PlacesClient::new(
            Client::new(),
            GoogleMapsSettings {
                api_key: Some(Secret::new("maps-key".to_string())),
                api_base: "https://maps.googleapis.com/maps/api/place".to_string(),
            },
        );

        let first = client.photo_url("Aap_uE/abc", 400);
        assert_eq!(first, client.photo_url("Aap_uE/abc", 400));
        assert_eq!(
            first,
            "https://maps.googleapis.com/maps/api/place/photo?maxwidth=400&photo_reference=Aap_uE%2Fabc&key=maps-key"
        );
    }

    #[test]
    fn transport_error_maps_to_server_error() {
        let err: AppError = PlacesError::Transport {
            message: "HTTP 502".into(),
            body: Some(json!({ "error": "bad gateway" })),
        }
        .into();
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(err.body().details.unwrap()["error"], "bad gateway");
    }
}

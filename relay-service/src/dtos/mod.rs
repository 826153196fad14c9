//! Request and response shapes of the relay's HTTP contract.

use crate::config::ServiceStatus;
use crate::services::providers::ProviderKind;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    /// Only used for logging; any JSON type is accepted.
    pub user_id: Option<Value>,
}

impl ChatRequest {
    /// `userId` as it should appear in logs.
    pub fn user_label(&self) -> String {
        match &self.user_id {
            None | Some(Value::Null) => "anonymous".to_string(),
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub source: ProviderKind,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlacesQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub radius: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: Option<String>,
    pub address: String,
    pub rating: Rating,
    pub location: PlaceLocation,
    /// Reference of the first photo, if any.
    pub photos: Option<String>,
    pub google_maps_uri: Option<String>,
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaceLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A place's rating; serialized as a number or the string `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rating {
    Score(f64),
    NotAvailable,
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rating::Score(score) => serializer.serialize_f64(*score),
            Rating::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUrlQuery {
    pub photo_reference: Option<String>,
    pub max_width: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUrlResponse {
    pub image_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetailsQuery {
    pub place_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestGeminiResponse {
    pub success: bool,
    /// Untouched upstream payload.
    pub response: Value,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub services: ServiceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chat_request(body: Value) -> ChatRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn user_label_accepts_any_json_type() {
        assert_eq!(chat_request(json!({ "userId": "u-1" })).user_label(), "u-1");
        assert_eq!(chat_request(json!({ "userId": 42 })).user_label(), "42");
        assert_eq!(chat_request(json!({ "userId": null })).user_label(), "anonymous");
        assert_eq!(chat_request(json!({})).user_label(), "anonymous");
    }

    #[test]
    fn rating_serializes_score_or_placeholder() {
        assert_eq!(serde_json::to_value(Rating::Score(4.5)).unwrap(), json!(4.5));
        assert_eq!(serde_json::to_value(Rating::NotAvailable).unwrap(), json!("N/A"));
    }
}

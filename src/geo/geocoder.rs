use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use super::Coordinates;
use crate::errors::AppError;

/// Resolves a free-text address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, AppError>;
}

/// Forward geocoding against the Mapbox places endpoint.
pub struct MapboxGeocoder {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    /// `[lon, lat]`
    center: [f64; 2],
}

#[derive(Deserialize)]
struct ErrorStatus {
    message: Option<String>,
}

impl MapboxGeocoder {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("GEOCODER_URL: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn request_url(&self, address: &str) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("GEOCODER_URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places"])
            .push(&format!("{address}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", &self.api_key)
            .append_pair("limit", "1");
        Ok(url)
    }
}

/// Pick the first feature of a places response.
fn first_feature(body: &str) -> Result<Coordinates, AppError> {
    let collection: FeatureCollection = serde_json::from_str(body)
        .map_err(|e| AppError::GeocodeFailure(format!("unreadable response: {e}")))?;
    collection
        .features
        .first()
        .map(|f| Coordinates::new(f.center[1], f.center[0]))
        .ok_or_else(|| AppError::GeocodeFailure("no matching location".to_string()))
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, AppError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::GeocodeFailure("event has no location".to_string()));
        }
        let url = self.request_url(address)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::GeocodeFailure(e.without_url().to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::GeocodeFailure(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorStatus>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            return Err(AppError::GeocodeFailure(message));
        }
        first_feature(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_encodes_address() {
        let geocoder = MapboxGeocoder::new("https://api.mapbox.com", "pk.test").unwrap();
        let url = geocoder.request_url("Memorial Union, Tempe AZ").unwrap();
        assert_eq!(
            url.path(),
            "/geocoding/v5/mapbox.places/Memorial%20Union,%20Tempe%20AZ.json"
        );
        assert!(url.query().unwrap().contains("access_token=pk.test"));
        assert!(url.query().unwrap().contains("limit=1"));
    }

    #[test]
    fn first_feature_swaps_axis_order() {
        let body = r#"{"type":"FeatureCollection","features":[{"center":[-111.94,33.4255]}]}"#;
        let coords = first_feature(body).unwrap();
        assert_eq!(coords, Coordinates::new(33.4255, -111.94));
    }

    #[test]
    fn empty_feature_list_fails() {
        let body = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(matches!(
            first_feature(body),
            Err(AppError::GeocodeFailure(_))
        ));
    }
}

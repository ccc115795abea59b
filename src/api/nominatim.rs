use serde::Deserialize;
use std::time::Duration;

use crate::config::EndpointConfig;
use crate::domain::Coordinates;
use crate::error::GeocodeError;

/// Resolves a free-text place name to a single coordinate pair
pub trait Geocoder {
    fn geocode(&self, query: &str) -> Result<Coordinates, GeocodeError>;
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn geocode(&self, query: &str) -> Result<Coordinates, GeocodeError> {
        (**self).geocode(query)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

/// Nominatim search client. The first match is taken as authoritative.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl NominatimClient {
    pub fn new(endpoints: &EndpointConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&endpoints.user_agent)
            .timeout(Duration::from_secs(endpoints.timeout_secs))
            .build()
            .map_err(|e| GeocodeError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: endpoints.nominatim_url.clone(),
        })
    }
}

impl Geocoder for NominatimClient {
    /// Geocode a place name to latitude/longitude coordinates.
    ///
    /// # Returns
    /// * `Ok(coords)` - Location of the first match
    /// * `Err(NotFound)` - Nominatim returned no matches
    /// * `Err(Transport)` - Request failed or the response was malformed
    fn geocode(&self, query: &str) -> Result<Coordinates, GeocodeError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Transport(format!(
                "Nominatim API returned error status: {}",
                response.status()
            )));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .map_err(|e| GeocodeError::Transport(format!("invalid Nominatim response: {e}")))?;

        first_match(results, query)
    }
}

fn first_match(results: Vec<NominatimResult>, query: &str) -> Result<Coordinates, GeocodeError> {
    let result = results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NotFound(query.to_string()))?;

    let lat: f64 = result
        .lat
        .parse()
        .map_err(|_| GeocodeError::Transport(format!("bad latitude '{}'", result.lat)))?;
    let lon: f64 = result
        .lon
        .parse()
        .map_err(|_| GeocodeError::Transport(format!("bad longitude '{}'", result.lon)))?;

    Ok(Coordinates::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nominatim_response() {
        // Sample response from Nominatim
        let json = r#"[
            {"lat":"39.7990175","lon":"-89.6439575","display_name":"Springfield, Sangamon County, Illinois"},
            {"lat":"37.2090","lon":"-93.2923","display_name":"Springfield, Missouri"}
        ]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();

        let coords = first_match(results, "Springfield").unwrap();
        assert_eq!(coords, Coordinates::new(39.7990175, -89.6439575));
    }

    #[test]
    fn test_no_match_is_not_found() {
        let results: Vec<NominatimResult> = serde_json::from_str("[]").unwrap();
        match first_match(results, "Atlantis") {
            Err(GeocodeError::NotFound(q)) => assert_eq!(q, "Atlantis"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_coordinate_is_transport_error() {
        let results = vec![NominatimResult {
            lat: "north".to_string(),
            lon: "1.0".to_string(),
        }];
        assert!(matches!(
            first_match(results, "x"),
            Err(GeocodeError::Transport(_))
        ));
    }
}

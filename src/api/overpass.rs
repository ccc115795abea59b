use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::EndpointConfig;
use crate::domain::Coordinates;
use crate::error::QueryError;

/// Fetches raw hospital-tagged elements around a point
pub trait FacilityQuery {
    fn fetch_hospitals(
        &self,
        center: Coordinates,
        radius_m: u32,
    ) -> Result<OverpassResponse, QueryError>;
}

impl<T: FacilityQuery + ?Sized> FacilityQuery for &T {
    fn fetch_hospitals(
        &self,
        center: Coordinates,
        radius_m: u32,
    ) -> Result<OverpassResponse, QueryError> {
        (**self).fetch_hospitals(center, radius_m)
    }
}

/// Raw Overpass API response
#[derive(Debug, Default, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,
}

/// A single element from Overpass (node, way or relation)
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u64,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Only present for ways and relations when requested with `out center`
    #[serde(default)]
    pub center: Option<Center>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

impl Element {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .as_ref()
            .and_then(|t| t.get(key))
            .map(String::as_str)
    }
}

/// Build the Overpass QL query for all hospital nodes, ways and relations
/// within `radius_m` of `center`
pub fn build_hospital_query(center: Coordinates, radius_m: u32, timeout_secs: u64) -> String {
    let around = format!("around:{},{},{}", radius_m, center.lat, center.lon);

    format!(
        r#"[out:json][timeout:{timeout_secs}];
(
  node["amenity"="hospital"]({around});
  way["amenity"="hospital"]({around});
  relation["amenity"="hospital"]({around});
);
out center;"#
    )
}

#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::blocking::Client,
    url: String,
    timeout_secs: u64,
}

impl OverpassClient {
    pub fn new(endpoints: &EndpointConfig) -> Result<Self, QueryError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&endpoints.user_agent)
            // Client timeout slightly higher than the server's
            .timeout(Duration::from_secs(endpoints.overpass_timeout_secs + 20))
            .build()
            .map_err(|e| QueryError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: endpoints.overpass_url.clone(),
            timeout_secs: endpoints.overpass_timeout_secs,
        })
    }
}

impl FacilityQuery for OverpassClient {
    fn fetch_hospitals(
        &self,
        center: Coordinates,
        radius_m: u32,
    ) -> Result<OverpassResponse, QueryError> {
        let query = build_hospital_query(center, radius_m, self.timeout_secs);
        log::debug!("Overpass query:\n{}", query);

        // Overpass expects form-encoded POST data: data=<query>
        let response = self
            .client
            .post(&self.url)
            .form(&[("data", query.as_str())])
            .send()
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QueryError::Transport(format!(
                "Overpass API returned error status: {}",
                response.status()
            )));
        }

        response
            .json()
            .map_err(|e| QueryError::Transport(format!("invalid Overpass response: {e}")))
    }
}

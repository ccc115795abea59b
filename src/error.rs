use thiserror::Error;

/// Failure to turn a place name into coordinates
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no geocoding match for '{0}'")]
    NotFound(String),
    #[error("geocoding request failed: {0}")]
    Transport(String),
}

/// Failure to fetch facilities from Overpass
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("facility query failed: {0}")]
    Transport(String),
}

/// Fatal errors of a hospital search. Fallback problems never end up here.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to geocode city")]
    GeocodeFailed(#[from] GeocodeError),
    #[error("failed to fetch hospital data")]
    QueryFailed(#[from] QueryError),
}

/// Failures inside the map-search fallback; logged and swallowed at the source boundary
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("map search request failed: {0}")]
    Transport(String),
    #[error("map search page could not be parsed: {0}")]
    Parse(String),
}

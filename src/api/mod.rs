pub mod maps_search;
pub mod nominatim;
pub mod overpass;
pub mod throttle;

pub use maps_search::{DisabledFallback, FacilityFallbackSource, MapSearchScraper};
pub use nominatim::{Geocoder, NominatimClient};
pub use overpass::{Element, FacilityQuery, OverpassClient, OverpassResponse};
pub use throttle::RateLimitedRunner;

//! Best-effort fallback: scrape hospital names from a map-search results
//! page and geocode each one through Nominatim.
//!
//! The page is rendered mostly client-side, so the static HTML rarely holds
//! result cards. Treat anything found here as a bonus.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::nominatim::Geocoder;
use super::throttle::RateLimitedRunner;
use crate::config::EndpointConfig;
use crate::domain::{Coordinates, HospitalRecord};
use crate::error::ScrapeError;

/// A secondary source of hospitals, consulted when the primary one comes up short.
///
/// Implementations never fail: any problem degrades to an empty list.
pub trait FacilityFallbackSource {
    fn find_hospitals(&self, city: &str) -> Vec<HospitalRecord>;
}

impl<T: FacilityFallbackSource + ?Sized> FacilityFallbackSource for Box<T> {
    fn find_hospitals(&self, city: &str) -> Vec<HospitalRecord> {
        (**self).find_hospitals(city)
    }
}

impl<T: FacilityFallbackSource + ?Sized> FacilityFallbackSource for &T {
    fn find_hospitals(&self, city: &str) -> Vec<HospitalRecord> {
        (**self).find_hospitals(city)
    }
}

/// Fallback that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledFallback;

impl FacilityFallbackSource for DisabledFallback {
    fn find_hospitals(&self, _city: &str) -> Vec<HospitalRecord> {
        Vec::new()
    }
}

const CARD_SELECTOR: &str = r#"div[role="article"]"#;
const NAME_SELECTOR: &str = "h3";
const ADDRESS_SELECTOR: &str = ".address";

pub struct MapSearchScraper<G> {
    client: reqwest::blocking::Client,
    base_url: String,
    geocoder: G,
    geocode_delay: Duration,
}

impl<G: Geocoder> MapSearchScraper<G> {
    pub fn new(
        endpoints: &EndpointConfig,
        geocoder: G,
        geocode_delay: Duration,
    ) -> Result<Self, ScrapeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&endpoints.browser_user_agent)
            .timeout(Duration::from_secs(endpoints.timeout_secs))
            .build()
            .map_err(|e| ScrapeError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: endpoints.maps_search_url.clone(),
            geocoder,
            geocode_delay,
        })
    }

    fn fetch_page(&self, city: &str) -> Result<String, ScrapeError> {
        let url = search_url(&self.base_url, city)?;
        log::debug!("Fetching map search page {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ScrapeError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScrapeError::Transport(format!(
                "map search returned error status: {}",
                response.status()
            )));
        }

        response
            .text()
            .map_err(|e| ScrapeError::Transport(e.to_string()))
    }

    fn try_find(&self, city: &str) -> Result<Vec<HospitalRecord>, ScrapeError> {
        let html = self.fetch_page(city)?;
        let candidates = parse_candidates(&html, city)?;
        log::info!("Map search found {} candidate(s)", candidates.len());

        let mut runner = RateLimitedRunner::new(self.geocode_delay);
        Ok(resolve_candidates(
            candidates,
            city,
            &self.geocoder,
            &mut runner,
        ))
    }
}

impl<G: Geocoder> FacilityFallbackSource for MapSearchScraper<G> {
    fn find_hospitals(&self, city: &str) -> Vec<HospitalRecord> {
        match self.try_find(city) {
            Ok(hospitals) => hospitals,
            Err(e) => {
                log::warn!("Map search fallback degraded to no results: {}", e);
                Vec::new()
            }
        }
    }
}

/// Build `{base}/hospitals%20in%20{city}`
pub fn search_url(base: &str, city: &str) -> Result<Url, ScrapeError> {
    let mut url =
        Url::parse(base).map_err(|e| ScrapeError::Transport(format!("bad search URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ScrapeError::Transport(format!("search URL cannot take a path: {base}")))?
        .pop_if_empty()
        .push(&format!("hospitals in {}", city));
    Ok(url)
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("{css}: {e}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Pull hospital candidates out of result cards.
///
/// Every candidate starts at the sentinel location. Cards without a heading
/// are skipped; a missing address falls back to the city name.
pub fn parse_candidates(html: &str, city: &str) -> Result<Vec<HospitalRecord>, ScrapeError> {
    let document = Html::parse_document(html);
    let card = selector(CARD_SELECTOR)?;
    let heading = selector(NAME_SELECTOR)?;
    let address = selector(ADDRESS_SELECTOR)?;

    let candidates = document
        .select(&card)
        .filter_map(|el| {
            let name = el.select(&heading).next().map(element_text)?;
            if name.is_empty() {
                return None;
            }

            let addr = el
                .select(&address)
                .map(element_text)
                .collect::<Vec<_>>()
                .join("");
            let addr = if addr.is_empty() {
                city.to_string()
            } else {
                addr
            };

            Some(HospitalRecord::new(name, addr, Coordinates::SENTINEL))
        })
        .collect();

    Ok(candidates)
}

/// Geocode every unresolved candidate as "{name}, {city}", one at a time.
///
/// Lookup failures are logged and leave the candidate unresolved; anything
/// still at the sentinel afterwards is dropped.
pub fn resolve_candidates<G: Geocoder + ?Sized>(
    mut candidates: Vec<HospitalRecord>,
    city: &str,
    geocoder: &G,
    runner: &mut RateLimitedRunner,
) -> Vec<HospitalRecord> {
    let unresolved = candidates
        .iter_mut()
        .filter(|c| c.coordinates().is_sentinel());

    runner.run_all(unresolved, |candidate| {
        let query = format!("{}, {}", candidate.name, city);
        match geocoder.geocode(&query) {
            Ok(coords) => candidate.set_coordinates(coords),
            Err(e) => log::warn!("Failed to geocode {}: {}", candidate.name, e),
        }
    });

    candidates.retain(|c| !c.coordinates().is_sentinel());
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeocodeError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeGeocoder {
        known: HashMap<String, Coordinates>,
        queries: RefCell<Vec<String>>,
    }

    impl FakeGeocoder {
        fn new(known: &[(&str, Coordinates)]) -> Self {
            Self {
                known: known
                    .iter()
                    .map(|(q, c)| (q.to_string(), *c))
                    .collect(),
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl Geocoder for FakeGeocoder {
        fn geocode(&self, query: &str) -> Result<Coordinates, GeocodeError> {
            self.queries.borrow_mut().push(query.to_string());
            self.known
                .get(query)
                .copied()
                .ok_or_else(|| GeocodeError::NotFound(query.to_string()))
        }
    }

    const PAGE: &str = r#"
        <html><body>
          <div role="article">
            <h3> Springfield Clinic </h3><h3>ignored</h3>
            <span class="address">1025 S 6th St</span>
          </div>
          <div role="article"><h3>HSHS St. John's Hospital</h3></div>
          <div role="article"><span class="address">no name here</span></div>
          <div><h3>Not a card</h3></div>
        </body></html>
    "#;

    #[test]
    fn test_parse_candidates() {
        let candidates = parse_candidates(PAGE, "Springfield").unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Springfield Clinic");
        assert_eq!(candidates[0].address, "1025 S 6th St");
        assert_eq!(candidates[1].name, "HSHS St. John's Hospital");
        assert_eq!(candidates[1].address, "Springfield");
        assert!(candidates.iter().all(|c| c.coordinates().is_sentinel()));
    }

    #[test]
    fn test_parse_page_without_cards() {
        let candidates = parse_candidates("<html><body>consent</body></html>", "X").unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_resolve_drops_unresolved() {
        let candidates = parse_candidates(PAGE, "Springfield").unwrap();
        let geocoder = FakeGeocoder::new(&[(
            "Springfield Clinic, Springfield",
            Coordinates::new(39.79, -89.65),
        )]);
        let mut runner = RateLimitedRunner::new(Duration::ZERO);

        let resolved = resolve_candidates(candidates, "Springfield", &geocoder, &mut runner);

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "Springfield Clinic");
        assert_eq!(resolved[0].coordinates(), Coordinates::new(39.79, -89.65));
        // The failed lookup did not stop the batch
        assert_eq!(
            *geocoder.queries.borrow(),
            vec![
                "Springfield Clinic, Springfield".to_string(),
                "HSHS St. John's Hospital, Springfield".to_string(),
            ]
        );
    }

    #[test]
    fn test_resolve_skips_already_located() {
        let located = HospitalRecord::new("Known", "x", Coordinates::new(1.0, 1.0));
        let geocoder = FakeGeocoder::new(&[]);
        let mut runner = RateLimitedRunner::new(Duration::ZERO);

        let resolved = resolve_candidates(vec![located], "City", &geocoder, &mut runner);

        assert_eq!(resolved.len(), 1);
        assert!(geocoder.queries.borrow().is_empty());
    }

    #[test]
    fn test_lookups_are_spaced_by_delay() {
        let candidates = vec![
            HospitalRecord::new("First", "a", Coordinates::SENTINEL),
            HospitalRecord::new("Second", "b", Coordinates::SENTINEL),
            HospitalRecord::new("Located", "c", Coordinates::new(2.0, 2.0)),
        ];
        let geocoder = FakeGeocoder::new(&[
            ("First, Town", Coordinates::new(1.0, 1.0)),
            ("Second, Town", Coordinates::new(1.5, 1.5)),
        ]);
        let mut runner = RateLimitedRunner::new(Duration::from_millis(60));
        let start = std::time::Instant::now();

        let resolved = resolve_candidates(candidates, "Town", &geocoder, &mut runner);

        assert_eq!(resolved.len(), 3);
        // One pause between the two lookups; the located record costs nothing
        assert!(start.elapsed() >= Duration::from_millis(60));
        assert_eq!(geocoder.queries.borrow().len(), 2);
    }

    #[test]
    fn test_geocoded_to_sentinel_is_dropped() {
        let candidates = vec![HospitalRecord::new("Null Island", "sea", Coordinates::SENTINEL)];
        let geocoder = FakeGeocoder::new(&[("Null Island, Sea", Coordinates::SENTINEL)]);
        let mut runner = RateLimitedRunner::new(Duration::ZERO);

        assert!(resolve_candidates(candidates, "Sea", &geocoder, &mut runner).is_empty());
    }

    #[test]
    fn test_search_url() {
        let url = search_url("https://www.google.com/maps/search/", "New York").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/maps/search/hospitals%20in%20New%20York"
        );

        let url = search_url("http://localhost:9000/search", "Köln").unwrap();
        assert!(url.as_str().starts_with("http://localhost:9000/search/hospitals%20in%20K"));
    }

    #[test]
    fn test_unreachable_page_degrades_to_empty() {
        let endpoints = EndpointConfig {
            maps_search_url: "not a url".to_string(),
            ..EndpointConfig::default()
        };
        let scraper =
            MapSearchScraper::new(&endpoints, FakeGeocoder::new(&[]), Duration::ZERO).unwrap();

        assert!(scraper.find_hospitals("Springfield").is_empty());
    }

    #[test]
    fn test_disabled_fallback() {
        assert!(DisabledFallback.find_hospitals("Springfield").is_empty());
    }
}

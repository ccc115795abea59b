//! Hospital discovery: geocode the city, query Overpass, normalize, and top up
//! from the fallback source when the primary results are thin.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use crate::api::{
    DisabledFallback, FacilityFallbackSource, FacilityQuery, Geocoder, MapSearchScraper,
    NominatimClient, OverpassClient,
};
use crate::config::{DEFAULT_FALLBACK_THRESHOLD, DEFAULT_RADIUS_M, FileConfig};
use crate::domain::HospitalRecord;
use crate::error::SearchError;
use crate::osm::parse_hospitals;

/// Where a search currently is. Runs strictly in declaration order, with
/// `Scraping` skipped when the primary results are sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Idle,
    Geocoding,
    QueryingFacilities,
    Normalizing,
    Scraping,
    Merging,
    Done,
    Failed,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchStage::Idle => "idle",
            SearchStage::Geocoding => "geocoding city",
            SearchStage::QueryingFacilities => "querying facilities",
            SearchStage::Normalizing => "normalizing results",
            SearchStage::Scraping => "searching fallback source",
            SearchStage::Merging => "merging results",
            SearchStage::Done => "done",
            SearchStage::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub radius_m: u32,
    /// Consult the fallback when fewer records than this were found
    pub fallback_threshold: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
        }
    }
}

pub struct HospitalFinder<G, Q, F> {
    geocoder: G,
    facilities: Q,
    fallback: F,
    settings: SearchSettings,
}

/// The finder wired to the real services
pub type DefaultFinder =
    HospitalFinder<NominatimClient, OverpassClient, Box<dyn FacilityFallbackSource>>;

impl DefaultFinder {
    pub fn from_config(config: &FileConfig) -> Result<Self> {
        let geocoder =
            NominatimClient::new(&config.endpoints).context("Failed to set up geocoder")?;
        let facilities =
            OverpassClient::new(&config.endpoints).context("Failed to set up Overpass client")?;

        let fallback: Box<dyn FacilityFallbackSource> = if config.fallback {
            Box::new(
                MapSearchScraper::new(
                    &config.endpoints,
                    geocoder.clone(),
                    Duration::from_millis(config.rate_limit.geocode_delay_ms),
                )
                .context("Failed to set up map search fallback")?,
            )
        } else {
            Box::new(DisabledFallback)
        };

        let settings = SearchSettings {
            radius_m: config.radius,
            fallback_threshold: config.fallback_threshold,
        };

        Ok(HospitalFinder::new(geocoder, facilities, fallback, settings))
    }
}

impl<G, Q, F> HospitalFinder<G, Q, F>
where
    G: Geocoder,
    Q: FacilityQuery,
    F: FacilityFallbackSource,
{
    pub fn new(geocoder: G, facilities: Q, fallback: F, settings: SearchSettings) -> Self {
        Self {
            geocoder,
            facilities,
            fallback,
            settings,
        }
    }

    /// Find hospitals near `city`.
    ///
    /// Geocoding and facility query failures abort the whole search.
    /// The fallback source can only add records, never fail the call.
    pub fn search_hospitals(&self, city: &str) -> Result<Vec<HospitalRecord>, SearchError> {
        self.search_with_progress(city, |_| {})
    }

    /// Same as [`search_hospitals`](Self::search_hospitals), reporting each
    /// stage as it is entered
    pub fn search_with_progress(
        &self,
        city: &str,
        mut on_stage: impl FnMut(SearchStage),
    ) -> Result<Vec<HospitalRecord>, SearchError> {
        let mut enter = |stage: SearchStage| {
            log::debug!("Search for '{}': {}", city, stage);
            on_stage(stage);
        };

        let result = self.run(city, &mut enter);
        enter(if result.is_ok() {
            SearchStage::Done
        } else {
            SearchStage::Failed
        });

        if let Err(ref e) = result {
            log::debug!("Search for '{}' failed: {}", city, e);
        }
        result
    }

    fn run(
        &self,
        city: &str,
        enter: &mut impl FnMut(SearchStage),
    ) -> Result<Vec<HospitalRecord>, SearchError> {
        enter(SearchStage::Geocoding);
        let center = self.geocoder.geocode(city)?;
        log::info!("Geocoded '{}' to ({:.4}, {:.4})", city, center.lat, center.lon);

        enter(SearchStage::QueryingFacilities);
        let response = self
            .facilities
            .fetch_hospitals(center, self.settings.radius_m)?;

        enter(SearchStage::Normalizing);
        let primary = parse_hospitals(&response, city);
        log::info!(
            "Found {} hospital(s) among {} element(s)",
            primary.len(),
            response.elements.len()
        );

        let extra = if primary.len() < self.settings.fallback_threshold {
            enter(SearchStage::Scraping);
            let mut extra = self.fallback.find_hospitals(city);
            log::info!("Fallback source returned {} hospital(s)", extra.len());
            extra.retain(|r| !r.coordinates().is_sentinel());
            extra
        } else {
            Vec::new()
        };

        enter(SearchStage::Merging);
        Ok(merge_by_name(primary, extra))
    }
}

/// Append `fallback` records whose lowercase name is not yet present.
///
/// Primary order is kept, followed by fallback order; first occurrence wins.
pub fn merge_by_name(
    primary: Vec<HospitalRecord>,
    fallback: Vec<HospitalRecord>,
) -> Vec<HospitalRecord> {
    let mut names: HashSet<String> = primary.iter().map(HospitalRecord::name_key).collect();
    let mut merged = primary;

    for record in fallback {
        if names.insert(record.name_key()) {
            merged.push(record);
        }
    }

    merged
}

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;

use crate::domain::{Coordinates, HospitalRecord};

pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 51.505,
    lon: -0.09,
};
pub const OVERVIEW_ZOOM: u8 = 12;
pub const SELECTED_ZOOM: u8 = 15;

/// What part of the map is on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapViewport {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: OVERVIEW_ZOOM,
        }
    }
}

impl MapViewport {
    /// Overview of a result set, centred on its first record
    pub fn overview(records: &[HospitalRecord]) -> Self {
        match records.first() {
            Some(first) => Self {
                center: first.coordinates(),
                zoom: OVERVIEW_ZOOM,
            },
            None => Self::default(),
        }
    }

    /// Close-up on one record
    pub fn focus(record: &HospitalRecord) -> Self {
        Self {
            center: record.coordinates(),
            zoom: SELECTED_ZOOM,
        }
    }
}

/// One GeoJSON point feature per record. GeoJSON orders positions lon, lat.
pub fn to_geojson(records: &[HospitalRecord]) -> Value {
    let features: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [r.longitude, r.latitude],
                },
                "properties": {
                    "id": r.id,
                    "name": r.name,
                    "address": r.address,
                    "phone": r.phone,
                    "website": r.website,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub fn write_geojson(path: &Path, records: &[HospitalRecord]) -> Result<()> {
    let body = serde_json::to_string_pretty(&to_geojson(records))
        .context("Failed to serialize GeoJSON")?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write GeoJSON file: {}", path.display()))
}

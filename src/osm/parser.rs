use crate::api::OverpassResponse;
use crate::api::overpass::Element;
use crate::domain::{Coordinates, HospitalRecord, UNKNOWN_HOSPITAL};
use std::collections::HashSet;

/// Parse Overpass response into hospital records
///
/// # Algorithm
/// 1. Keep only elements tagged `amenity=hospital`
/// 2. Skip element ids already seen in this response
/// 3. Locate: own lat/lon for nodes, `center` for ways and relations
/// 4. Flatten tags into a record, using `city` when `addr:city` is missing
pub fn parse_hospitals(response: &OverpassResponse, city: &str) -> Vec<HospitalRecord> {
    let mut seen = HashSet::new();
    let mut hospitals = Vec::new();

    for element in &response.elements {
        if element.tag("amenity") != Some("hospital") {
            continue;
        }

        if !seen.insert(element.id) {
            continue;
        }

        let location = match element_location(element) {
            Some(l) => l,
            None => continue,
        };

        hospitals.push(to_record(element, location, city));
    }

    hospitals
}

fn element_location(element: &Element) -> Option<Coordinates> {
    match (element.lat, element.lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => element.center.map(|c| Coordinates::new(c.lat, c.lon)),
    }
}

/// First non-empty value among `keys`
fn first_tag(element: &Element, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| element.tag(k))
        .find(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn build_address(element: &Element, city: &str) -> String {
    let city_part = first_tag(element, &["addr:city"]).unwrap_or_else(|| city.to_string());

    [
        first_tag(element, &["addr:housenumber"]),
        first_tag(element, &["addr:street"]),
        Some(city_part),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

fn to_record(element: &Element, location: Coordinates, city: &str) -> HospitalRecord {
    let name = first_tag(element, &["name"]).unwrap_or_else(|| UNKNOWN_HOSPITAL.to_string());
    let healthcare = first_tag(element, &["healthcare"]);

    let mut record = HospitalRecord::new(name, build_address(element, city), location);
    record.phone = first_tag(element, &["phone", "contact:phone"]);
    record.website = first_tag(element, &["website", "contact:website"]);
    record.facility_type = Some(healthcare.clone().unwrap_or_else(|| "Hospital".to_string()));
    record.services = healthcare.into_iter().collect();
    record
}

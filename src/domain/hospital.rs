use serde::Serialize;
use uuid::Uuid;

/// Placeholder name for facilities that carry no `name` tag
pub const UNKNOWN_HOSPITAL: &str = "Unknown Hospital";

/// A WGS84 coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Marks a location that has not been resolved yet
    pub const SENTINEL: Coordinates = Coordinates { lat: 0.0, lon: 0.0 };

    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_sentinel(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

/// A hospital as shown to the user, flattened from whichever source found it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalRecord {
    /// Generated per record, not stable across searches
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "type")]
    pub facility_type: Option<String>,
    pub services: Vec<String>,
}

impl HospitalRecord {
    /// Create a record with a fresh id and no optional details
    pub fn new(name: impl Into<String>, address: impl Into<String>, at: Coordinates) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            address: address.into(),
            phone: None,
            website: None,
            latitude: at.lat,
            longitude: at.lon,
            facility_type: None,
            services: Vec::new(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn set_coordinates(&mut self, at: Coordinates) {
        self.latitude = at.lat;
        self.longitude = at.lon;
    }

    /// Key used when merging results from different sources
    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_unique_id() {
        let a = HospitalRecord::new("A", "x", Coordinates::new(1.0, 2.0));
        let b = HospitalRecord::new("A", "x", Coordinates::new(1.0, 2.0));
        assert_ne!(a.id, b.id);
        assert_eq!(a.coordinates(), Coordinates::new(1.0, 2.0));
    }

    #[test]
    fn test_sentinel() {
        assert!(Coordinates::SENTINEL.is_sentinel());
        assert!(!Coordinates::new(0.0, 1.0).is_sentinel());
    }

    #[test]
    fn test_serializes_type_field() {
        let mut record = HospitalRecord::new("General", "1 Main St", Coordinates::new(1.0, 2.0));
        record.facility_type = Some("hospital".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "hospital");
        assert_eq!(json["latitude"], 1.0);
        assert!(json.get("facilityType").is_none());
    }
}

//! Presentation state: the current result list, its filter, the selected
//! hospital and the map viewport. The search pipeline knows nothing of this.

pub mod csv;
pub mod map;

pub use csv::{export_file_name, to_csv, write_csv};
pub use map::{MapViewport, to_geojson, write_geojson};

use crate::domain::HospitalRecord;

#[derive(Debug, Default)]
pub struct ResultsView {
    city: String,
    hospitals: Vec<HospitalRecord>,
    filter: String,
    selected: Option<String>,
    viewport: MapViewport,
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a fresh result set. Any selection belonged to the old set and is cleared.
    pub fn replace_results(&mut self, city: impl Into<String>, hospitals: Vec<HospitalRecord>) {
        self.city = city.into();
        self.viewport = MapViewport::overview(&hospitals);
        self.hospitals = hospitals;
        self.selected = None;
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn hospitals(&self) -> &[HospitalRecord] {
        &self.hospitals
    }

    pub fn set_filter(&mut self, term: impl Into<String>) {
        self.filter = term.into();
    }

    /// Records whose name or address contains the filter term, ignoring case
    pub fn filtered(&self) -> Vec<&HospitalRecord> {
        let term = self.filter.to_lowercase();
        self.hospitals
            .iter()
            .filter(|h| {
                h.name.to_lowercase().contains(&term) || h.address.to_lowercase().contains(&term)
            })
            .collect()
    }

    /// Select by id and zoom the map onto it. Unknown ids leave the view unchanged.
    pub fn select(&mut self, id: &str) -> Option<&HospitalRecord> {
        let record = self.hospitals.iter().find(|h| h.id == id)?;
        self.viewport = MapViewport::focus(record);
        self.selected = Some(record.id.clone());
        Some(record)
    }

    pub fn selected(&self) -> Option<&HospitalRecord> {
        let id = self.selected.as_deref()?;
        self.hospitals.iter().find(|h| h.id == id)
    }

    pub fn viewport(&self) -> MapViewport {
        self.viewport
    }

    /// CSV of every record, regardless of the filter
    pub fn export_csv(&self) -> String {
        to_csv(&self.hospitals)
    }

    pub fn export_file_name(&self) -> std::path::PathBuf {
        export_file_name(&self.city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;

    fn view() -> ResultsView {
        let mut view = ResultsView::new();
        view.replace_results(
            "Springfield",
            vec![
                HospitalRecord::new("Memorial Medical Center", "701 N 1st St", Coordinates::new(39.8, -89.6)),
                HospitalRecord::new("St. John's", "800 E Carpenter St", Coordinates::new(39.81, -89.64)),
                HospitalRecord::new("Springfield Clinic", "1025 S 6th St", Coordinates::new(39.79, -89.65)),
            ],
        );
        view
    }

    #[test]
    fn test_filter_matches_name_or_address() {
        let mut view = view();

        view.set_filter("MEMORIAL");
        assert_eq!(view.filtered().len(), 1);

        view.set_filter("st");
        assert_eq!(view.filtered().len(), 3);

        view.set_filter("carpenter");
        assert_eq!(view.filtered()[0].name, "St. John's");

        view.set_filter("");
        assert_eq!(view.filtered().len(), 3);

        view.set_filter("zzz");
        assert!(view.filtered().is_empty());
    }

    #[test]
    fn test_selection_moves_viewport() {
        let mut view = view();
        assert_eq!(view.viewport().center, Coordinates::new(39.8, -89.6));
        assert_eq!(view.viewport().zoom, 12);

        let id = view.hospitals()[1].id.clone();
        assert_eq!(view.select(&id).map(|h| h.name.as_str()), Some("St. John's"));
        assert_eq!(view.viewport().center, Coordinates::new(39.81, -89.64));
        assert_eq!(view.viewport().zoom, 15);
        assert_eq!(view.selected().map(|h| h.id.as_str()), Some(id.as_str()));

        assert!(view.select("missing").is_none());
        assert_eq!(view.selected().map(|h| h.id.as_str()), Some(id.as_str()));
    }

    #[test]
    fn test_new_results_clear_selection() {
        let mut view = view();
        let id = view.hospitals()[0].id.clone();
        view.select(&id);

        view.replace_results("Nowhere", Vec::new());

        assert!(view.selected().is_none());
        assert_eq!(view.viewport(), MapViewport::default());
        assert_eq!(view.city(), "Nowhere");
    }

    #[test]
    fn test_export_ignores_filter() {
        let mut view = view();
        view.set_filter("memorial");

        assert_eq!(view.export_csv().lines().count(), 4);
        assert_eq!(
            view.export_file_name(),
            std::path::PathBuf::from("hospitals_in_Springfield.csv")
        );
    }
}

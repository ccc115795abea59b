//! hospital-finder - Find hospitals near a city from OpenStreetMap data

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod osm;
pub mod pipeline;
pub mod view;

pub use domain::{Coordinates, HospitalRecord};
pub use error::{GeocodeError, QueryError, SearchError};
pub use pipeline::{DefaultFinder, HospitalFinder, SearchSettings, SearchStage, merge_by_name};
pub use view::ResultsView;

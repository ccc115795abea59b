pub mod hospital;

pub use hospital::{Coordinates, HospitalRecord, UNKNOWN_HOSPITAL};

// src/ingest/mod.rs
pub mod csv_input;

pub use csv_input::{load_profiles, parse_profiles, ParsedCsv, ProfileRow};

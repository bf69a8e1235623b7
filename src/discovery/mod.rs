// src/discovery/mod.rs
pub mod serpapi;

pub use serpapi::{write_profiles_csv, DiscoveredProfile, SerpApiClient};

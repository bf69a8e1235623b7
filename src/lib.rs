//! Founder tracker: watch LinkedIn profiles for founder transitions and
//! stealth-company joins, explain them and notify.

pub mod cli;
pub mod config;
pub mod core;
pub mod detection;
pub mod discovery;
pub mod enrichment;
pub mod google;
pub mod ingest;
pub mod insight;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod web;

pub use config::AppConfig;
pub use pipeline::{build_orchestrator, RunOrchestrator};
pub use web::start_web_server;

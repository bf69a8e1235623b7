// src/enrichment/mod.rs
//! Fresh profile data for a tracked identifier

pub mod proxycurl;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::ProfileData;

pub use proxycurl::ProxycurlClient;

#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// Current role data for a normalized identifier
    async fn fetch(&self, id: &str) -> Result<ProfileData>;
}

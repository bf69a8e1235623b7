// src/config.rs
//! Configuration: config.yaml sections per environment, secrets from the environment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub output_path: PathBuf,
    pub server: ServerSettings,
    pub logging: LoggingConfig,
    pub detection: DetectionConfig,
    pub enrichment: EnrichmentConfig,
    pub insight: InsightConfig,
    pub notify: NotifyConfig,
    pub discovery: DiscoveryConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/founder_tracker.db"),
            output_path: PathBuf::from("out"),
            server: ServerSettings::default(),
            logging: LoggingConfig::default(),
            detection: DetectionConfig::default(),
            enrichment: EnrichmentConfig::default(),
            insight: InsightConfig::default(),
            notify: NotifyConfig::default(),
            discovery: DiscoveryConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub address: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSON log file; stdout when unset
    pub file: Option<PathBuf>,
    /// EnvFilter directive used when RUST_LOG is unset
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub founder_keywords: Vec<String>,
    pub stealth_keywords: Vec<String>,
    pub placeholder_companies: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            founder_keywords: vec!["founder".to_string()],
            stealth_keywords: Vec::new(),
            placeholder_companies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub base_url: String,
    pub calls_per_minute: u32,
    pub timeout_seconds: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nubela.co".to_string(),
            calls_per_minute: 2,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 100,
            temperature: 0.7,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub email_recipients: Vec<String>,
    /// Mailbox the service account impersonates when sending
    pub email_sender: Option<String>,
    pub sheet_range: String,
    pub sheets_base_url: String,
    pub gmail_base_url: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            email_recipients: Vec::new(),
            email_sender: None,
            sheet_range: "Changes!A:F".to_string(),
            sheets_base_url: "https://sheets.googleapis.com".to_string(),
            gmail_base_url: "https://gmail.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://serpapi.com".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Secrets, read from environment variables only
#[derive(Clone, Default)]
pub struct Credentials {
    pub proxycurl_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub google_service_account_file: Option<PathBuf>,
    pub google_sheet_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("proxycurl_api_key", &redact(&self.proxycurl_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("serpapi_api_key", &redact(&self.serpapi_api_key))
            .field("google_service_account_file", &self.google_service_account_file)
            .field("google_sheet_id", &self.google_sheet_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            proxycurl_api_key: get("PROXYCURL_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            serpapi_api_key: get("SERPAPI_API_KEY"),
            google_service_account_file: get("GOOGLE_SERVICE_ACCOUNT_FILE").map(PathBuf::from),
            google_sheet_id: get("GOOGLE_SHEET_ID"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: AppConfig,
    production: Option<AppConfig>,
}

impl AppConfig {
    /// Load the section for the current environment and the credentials
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path, &environment)?
        } else {
            warn!(
                "{} not found, using built-in defaults",
                config_path.display()
            );
            Self::default()
        };

        config.database_path = Self::resolve_path(&config.database_path)?;
        config.output_path = Self::resolve_path(&config.output_path)?;
        if let Some(file) = &config.logging.file {
            config.logging.file = Some(Self::resolve_path(file)?);
        }
        config.credentials = Credentials::from_env();

        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("FOUNDER_TRACKER_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(config_path: &Path, environment: &str) -> Result<Self> {
        let config_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Self::from_yaml(&config_content, environment)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(content)?;

        let config = match environment {
            "production" => config_file
                .production
                .context("config has no 'production' section")?,
            _ => config_file.local,
        };
        Ok(config)
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    pub fn sheets_enabled(&self) -> bool {
        self.credentials.google_sheet_id.is_some()
    }

    pub fn email_enabled(&self) -> bool {
        !self.notify.email_recipients.is_empty()
    }

    /// Fail with every missing credential the configured pipeline needs
    pub fn validate_credentials(&self) -> Result<()> {
        let mut missing = Vec::new();

        if self.credentials.proxycurl_api_key.is_none() {
            missing.push("PROXYCURL_API_KEY");
        }
        if self.insight.enabled && self.credentials.openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if (self.sheets_enabled() || self.email_enabled())
            && self.credentials.google_service_account_file.is_none()
        {
            missing.push("GOOGLE_SERVICE_ACCOUNT_FILE");
        }
        if self.email_enabled() && self.notify.email_sender.is_none() {
            missing.push("notify.email_sender");
        }

        if !missing.is_empty() {
            anyhow::bail!("Missing required credentials: {}", missing.join(", "));
        }
        Ok(())
    }

    /// Ensure the database and output directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        if let Some(db_parent) = self.database_path.parent() {
            crate::utils::ensure_dir_exists(db_parent).await?;
        }
        crate::utils::ensure_dir_exists(&self.output_path).await?;
        if let Some(log_parent) = self.logging.file.as_deref().and_then(Path::parent) {
            crate::utils::ensure_dir_exists(log_parent).await?;
        }

        info!("All configured directories ensured to exist");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn credentials(pairs: &[(&str, &str)]) -> Credentials {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Credentials::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_follow_provider_limits() {
        let config = AppConfig::default();
        assert_eq!(config.enrichment.calls_per_minute, 2);
        assert_eq!(config.insight.model, "gpt-4o-mini");
        assert_eq!(config.detection.founder_keywords, vec!["founder".to_string()]);
        assert!(config.detection.stealth_keywords.is_empty());
    }

    #[test]
    fn test_yaml_sections_select_environment() {
        let yaml = r#"
local:
  detection:
    stealth_keywords: ["stealth"]
production:
  server:
    port: 9000
"#;
        let local = AppConfig::from_yaml(yaml, "local").unwrap();
        assert_eq!(local.detection.stealth_keywords, vec!["stealth".to_string()]);
        assert_eq!(local.server.port, 8000);

        let production = AppConfig::from_yaml(yaml, "production").unwrap();
        assert_eq!(production.server.port, 9000);
        assert_eq!(production.detection.founder_keywords, vec!["founder".to_string()]);
    }

    #[test]
    fn test_missing_production_section_is_an_error() {
        assert!(AppConfig::from_yaml("local: {}\n", "production").is_err());
    }

    #[test]
    fn test_validation_lists_every_missing_credential() {
        let mut config = AppConfig::default();
        config.notify.email_recipients = vec!["vc@example.com".to_string()];
        config.notify.email_sender = Some("bot@example.com".to_string());

        let message = config.validate_credentials().unwrap_err().to_string();
        assert!(message.contains("PROXYCURL_API_KEY"));
        assert!(message.contains("OPENAI_API_KEY"));
        assert!(message.contains("GOOGLE_SERVICE_ACCOUNT_FILE"));
    }

    #[test]
    fn test_validation_passes_with_minimal_setup() {
        let mut config = AppConfig::default();
        config.insight.enabled = false;
        config.credentials = credentials(&[("PROXYCURL_API_KEY", "pc-key"), ("OPENAI_API_KEY", " ")]);
        assert!(config.validate_credentials().is_ok());
        assert!(config.credentials.openai_api_key.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = credentials(&[("PROXYCURL_API_KEY", "super-secret")]);
        assert!(!format!("{:?}", creds).contains("super-secret"));
    }
}

//! Application configuration loaded from environment variables.
//!
//! The plan-to-tier map is configuration, not logic: billing reports a plan
//! identifier and this map decides which tier it grants.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::models::Tier;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID for Firestore
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Base URL of the billing subsystem
    pub billing_api_url: String,
    /// API key for the billing subsystem
    pub billing_api_key: String,
    /// File snapshot path for the local key-value store
    pub local_store_path: PathBuf,
    /// Billing plan id to tier mapping
    pub plan_map: HashMap<String, Tier>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            billing_api_url: "http://localhost:8081".to_string(),
            billing_api_key: "test_billing_key".to_string(),
            local_store_path: PathBuf::from("/tmp/muse_local_store.json"),
            plan_map: default_plan_map(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            billing_api_url: env::var("BILLING_API_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            billing_api_key: env::var("BILLING_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("BILLING_API_KEY"))?,
            local_store_path: env::var("LOCAL_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/local_store.json")),
            plan_map: env::var("PLAN_TIER_MAP")
                .map(|v| parse_plan_map(&v))
                .unwrap_or_else(|_| default_plan_map()),
        })
    }
}

/// Built-in plan mapping, overridable via `PLAN_TIER_MAP`.
fn default_plan_map() -> HashMap<String, Tier> {
    HashMap::from([
        ("plan_free".to_string(), Tier::Free),
        ("plan_pro".to_string(), Tier::Pro),
        ("plan_team".to_string(), Tier::Team),
    ])
}

/// Parse `PLAN_TIER_MAP` ("plan_pro=pro,plan_team=team").
///
/// Malformed entries are skipped; unknown tier names fail closed to guest
/// via `Tier::parse`.
fn parse_plan_map(raw: &str) -> HashMap<String, Tier> {
    raw.split(',')
        .filter_map(|entry| {
            let (plan, tier) = entry.split_once('=')?;
            let plan = plan.trim();
            if plan.is_empty() {
                return None;
            }
            Some((plan.to_string(), Tier::parse(tier)))
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Process env is shared across parallel tests; defaults are checked
    // on a directly constructed Config instead of through from_env.
    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.billing_api_key, "test_billing_key");
        assert_eq!(config.port, 8080);
        assert_eq!(config.plan_map.get("plan_pro"), Some(&Tier::Pro));
        assert!(config.jwt_signing_key.len() >= 16);
    }

    #[test]
    fn test_parse_plan_map() {
        let map = parse_plan_map("price_123=pro, price_456=team,broken,=free");
        assert_eq!(map.get("price_123"), Some(&Tier::Pro));
        assert_eq!(map.get("price_456"), Some(&Tier::Team));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_plan_map_unknown_tier_fails_closed() {
        let map = parse_plan_map("price_odd=platinum");
        assert_eq!(map.get("price_odd"), Some(&Tier::Guest));
    }
}

// SPDX-License-Identifier: MIT

//! Billing subsystem client for tier resolution.
//!
//! The payments side is an external collaborator: one idempotent call,
//! "get active subscription for owner", returning a status and a plan id.
//! Mapping plan id to tier is configuration (`Config::plan_map`). A failed
//! or missing lookup resolves to the free tier rather than blocking.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::AppError;
use crate::models::{SubscriptionStatus, Tier};

/// Billing API client.
#[derive(Clone)]
pub struct BillingClient {
    http: Option<reqwest::Client>,
    base_url: String,
    api_key: String,
}

/// Active subscription reported by billing.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionInfo {
    pub status: SubscriptionStatus,
    pub plan_id: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    subscription: Option<SubscriptionInfo>,
}

impl BillingClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: Some(reqwest::Client::new()),
            base_url,
            api_key,
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All billing lookups return an error, exercising the free-tier
    /// fallback path.
    pub fn new_mock() -> Self {
        Self {
            http: None,
            base_url: String::new(),
            api_key: String::new(),
        }
    }

    fn get_http(&self) -> Result<&reqwest::Client, AppError> {
        self.http
            .as_ref()
            .ok_or_else(|| AppError::BillingApi("Billing not connected (offline mode)".to_string()))
    }

    /// Get the active subscription for an owner, or None when they have none.
    pub async fn get_subscription(
        &self,
        owner_id: &str,
    ) -> Result<Option<SubscriptionInfo>, AppError> {
        let url = format!("{}/v1/subscriptions/{}", self.base_url, owner_id);

        let response = self
            .get_http()?
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::BillingApi(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BillingApi(format!("HTTP {}: {}", status, body)));
        }

        let parsed: SubscriptionResponse = response
            .json()
            .await
            .map_err(|e| AppError::BillingApi(format!("JSON parse error: {}", e)))?;

        Ok(parsed.subscription)
    }

    /// Resolve an account owner's tier.
    ///
    /// No subscription, an inactive one, or a failed lookup all resolve to
    /// `Free`; an unrecognized plan id resolves to `Free` as well.
    pub async fn resolve_tier(&self, owner_id: &str, plan_map: &HashMap<String, Tier>) -> Tier {
        match self.get_subscription(owner_id).await {
            Ok(Some(sub)) if sub.status.entitles_paid_tier() => {
                plan_map.get(&sub.plan_id).copied().unwrap_or_else(|| {
                    tracing::warn!(owner_id, plan_id = %sub.plan_id, "Unknown plan id, resolving to free");
                    Tier::Free
                })
            }
            Ok(_) => Tier::Free,
            Err(e) => {
                tracing::warn!(owner_id, error = %e, "Tier resolution failed, falling back to free");
                Tier::Free
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_resolves_to_free() {
        let client = BillingClient::new_mock();
        let tier = client.resolve_tier("user_1", &HashMap::new()).await;
        assert_eq!(tier, Tier::Free);
    }
}

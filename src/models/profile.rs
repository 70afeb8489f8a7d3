//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::guest::GuestSession;
use crate::models::tier::Tier;

/// User profile stored in Firestore, or synthesized locally for guests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Account id from the auth provider, or the guest session id.
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub tier: Tier,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    pub is_guest: bool,
    /// When the profile was first created (ISO 8601)
    pub created_at: String,
    /// Onboarding payload carried over from a guest session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub onboarding_data: Option<Value>,
    /// Project payload carried over from a guest session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub project_data: Option<Value>,
}

impl UserProfile {
    /// Synthesize a guest profile from a local session. Never persisted
    /// remotely; superseded on sign-in.
    pub fn guest(session: &GuestSession) -> Self {
        Self {
            id: session.id.clone(),
            email: None,
            name: None,
            avatar_url: None,
            tier: Tier::Guest,
            subscription_status: SubscriptionStatus::Canceled,
            is_guest: true,
            created_at: session.created_at.to_rfc3339(),
            onboarding_data: session.onboarding_data.clone(),
            project_data: session.project_data.clone(),
        }
    }
}

/// Subscription status reported by the billing subsystem.
///
/// Unknown status strings map to `Canceled`, which resolves to the free
/// tier for account owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Incomplete,
    #[default]
    #[serde(other)]
    Canceled,
}

impl SubscriptionStatus {
    /// Whether this status entitles the owner to their paid plan's tier.
    pub fn entitles_paid_tier(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_falls_to_canceled() {
        let status: SubscriptionStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(status, SubscriptionStatus::Canceled);
        assert!(!status.entitles_paid_tier());
    }

    #[test]
    fn test_trialing_entitles_paid_tier() {
        assert!(SubscriptionStatus::Trialing.entitles_paid_tier());
        assert!(!SubscriptionStatus::PastDue.entitles_paid_tier());
    }
}

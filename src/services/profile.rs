// SPDX-License-Identifier: MIT

//! Profile reconciliation and guest-to-account migration.

use std::collections::HashMap;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{GuestSession, MigrationPayload, SubscriptionStatus, Tier, UserProfile};
use crate::services::billing::BillingClient;
use crate::time_utils::format_utc_rfc3339;

/// Profile store backed by Firestore with billing-resolved tiers.
#[derive(Clone)]
pub struct ProfileService {
    db: FirestoreDb,
    billing: BillingClient,
    plan_map: HashMap<String, Tier>,
}

impl ProfileService {
    pub fn new(db: FirestoreDb, billing: BillingClient, plan_map: HashMap<String, Tier>) -> Self {
        Self {
            db,
            billing,
            plan_map,
        }
    }

    /// Get an account profile, creating a minimal row on first access.
    ///
    /// The tier is reconciled against billing on every read so a plan
    /// change shows up without a separate sync step. Billing failure
    /// degrades to the stored tier.
    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        let mut profile = match self.db.get_user(user_id).await? {
            Some(profile) => profile,
            None => {
                let profile = UserProfile {
                    id: user_id.to_string(),
                    email: None,
                    name: None,
                    avatar_url: None,
                    tier: Tier::Free,
                    subscription_status: SubscriptionStatus::Canceled,
                    is_guest: false,
                    created_at: format_utc_rfc3339(chrono::Utc::now()),
                    onboarding_data: None,
                    project_data: None,
                };
                self.db.upsert_user(&profile).await?;
                tracing::info!(user_id, "Created profile on first access");
                profile
            }
        };

        let resolved = self.billing.resolve_tier(user_id, &self.plan_map).await;
        if resolved != profile.tier {
            tracing::info!(
                user_id,
                from = profile.tier.as_str(),
                to = resolved.as_str(),
                "Tier changed at reconciliation"
            );
            profile.tier = resolved;
            // Best-effort: the caller still gets the reconciled view.
            if let Err(e) = self.db.upsert_user(&profile).await {
                tracing::warn!(user_id, error = %e, "Failed to persist reconciled tier");
            }
        }

        Ok(profile)
    }

    /// Copy a guest session's payload onto an account profile.
    ///
    /// Returns the payload that was migrated. Does not clear the guest
    /// session; the caller clears it only after this persists successfully.
    pub async fn migrate_guest(
        &self,
        user_id: &str,
        session: &GuestSession,
    ) -> Result<MigrationPayload, AppError> {
        let payload = session.migration_payload();

        let mut profile = self.get_profile(user_id).await?;
        if payload.onboarding_data.is_some() {
            profile.onboarding_data = payload.onboarding_data.clone();
        }
        if payload.project_data.is_some() {
            profile.project_data = payload.project_data.clone();
        }
        self.db.upsert_user(&profile).await?;

        tracing::info!(
            user_id,
            guest_id = %session.id,
            has_onboarding = payload.onboarding_data.is_some(),
            has_project = payload.project_data.is_some(),
            "Migrated guest session payload"
        );

        Ok(payload)
    }
}

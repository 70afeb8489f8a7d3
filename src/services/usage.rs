// SPDX-License-Identifier: MIT

//! Usage reconciliation: load, merge, persist.
//!
//! Guest usage lives in the local store; account usage lives in Firestore.
//! The failure policy differs by side: local writes are best-effort and
//! swallowed, remote writes surface to the caller so a failed persist is
//! never reported as success.

use std::sync::Arc;

use crate::db::{FirestoreDb, LocalStore};
use crate::error::AppError;
use crate::models::{Tier, UsageLimits, UsageUpdate};

const USAGE_KEY_PREFIX: &str = "muse_usage_";

/// Who a usage row belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    User(String),
    Guest(String),
}

impl Owner {
    pub fn id(&self) -> &str {
        match self {
            Owner::User(id) | Owner::Guest(id) => id,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Owner::Guest(_))
    }
}

/// Usage store spanning the local and remote halves.
#[derive(Clone)]
pub struct UsageService {
    db: FirestoreDb,
    local: Arc<LocalStore>,
}

impl UsageService {
    pub fn new(db: FirestoreDb, local: Arc<LocalStore>) -> Self {
        Self { db, local }
    }

    fn local_key(id: &str) -> String {
        format!("{}{}", USAGE_KEY_PREFIX, id)
    }

    /// Load an owner's usage row, creating it from tier defaults on first
    /// read.
    ///
    /// A missing row is not an error. The default row is persisted as a
    /// side effect; if that first-read persist fails the caller still gets
    /// the defaults (logged for accounts, silent best-effort for guests).
    pub async fn load(&self, owner: &Owner, tier: Tier) -> Result<UsageLimits, AppError> {
        match owner {
            Owner::Guest(id) => Ok(self.load_local(id, tier)),
            Owner::User(id) => {
                match self.db.get_usage(id).await {
                    Ok(Some(usage)) => Ok(usage),
                    Ok(None) => {
                        let defaults = tier.default_limits();
                        if let Err(e) = self.db.upsert_usage(id, &defaults).await {
                            tracing::warn!(owner_id = %id, error = %e, "First-read usage persist failed");
                        }
                        Ok(defaults)
                    }
                    Err(e) => {
                        // Stale-or-default beats blocking the profile view.
                        tracing::warn!(owner_id = %id, error = %e, "Usage fetch failed, falling back to tier defaults");
                        Ok(tier.default_limits())
                    }
                }
            }
        }
    }

    fn load_local(&self, id: &str, tier: Tier) -> UsageLimits {
        let key = Self::local_key(id);
        if let Some(raw) = self.local.get(&key) {
            match serde_json::from_str(&raw) {
                Ok(usage) => return usage,
                Err(e) => {
                    tracing::warn!(owner_id = id, error = %e, "Local usage row unparseable, resetting to defaults");
                }
            }
        }

        let defaults = tier.default_limits();
        self.persist_local(id, &defaults);
        defaults
    }

    /// Merge a partial update into the owner's row and persist the result.
    ///
    /// Returns the merged row. A failed remote persist is a failed
    /// operation; a failed local persist still returns the merged row.
    pub async fn update(
        &self,
        owner: &Owner,
        tier: Tier,
        update: &UsageUpdate,
    ) -> Result<UsageLimits, AppError> {
        let current = self.load(owner, tier).await?;
        let merged = current.merge(update);
        self.persist(owner, &merged).await?;
        Ok(merged)
    }

    /// Persist a usage row.
    pub async fn persist(&self, owner: &Owner, usage: &UsageLimits) -> Result<(), AppError> {
        match owner {
            Owner::Guest(id) => {
                self.persist_local(id, usage);
                Ok(())
            }
            Owner::User(id) => self.db.upsert_usage(id, usage).await,
        }
    }

    /// Remove a guest's local usage row (after migration).
    pub fn clear_local(&self, id: &str) {
        self.local.remove(&Self::local_key(id));
    }

    /// Best-effort local write.
    fn persist_local(&self, id: &str, usage: &UsageLimits) {
        match serde_json::to_string(usage) {
            Ok(raw) => self.local.set(&Self::local_key(id), &raw),
            Err(e) => tracing::warn!(owner_id = id, error = %e, "Local usage serialization failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CounterUpdate;

    fn offline_service() -> UsageService {
        UsageService::new(FirestoreDb::new_mock(), Arc::new(LocalStore::in_memory()))
    }

    #[tokio::test]
    async fn test_fresh_guest_gets_tier_defaults() {
        let service = offline_service();
        let owner = Owner::Guest("guest_1".to_string());

        let usage = service.load(&owner, Tier::Guest).await.unwrap();
        assert_eq!(usage, Tier::Guest.default_limits());
        assert_eq!(usage.arc_analyses.used, 0);
    }

    #[tokio::test]
    async fn test_guest_update_roundtrips_through_local_store() {
        let service = offline_service();
        let owner = Owner::Guest("guest_2".to_string());

        let update = UsageUpdate {
            projects: Some(CounterUpdate {
                used: 1,
                limit: 1,
                unlimited: false,
            }),
            ..Default::default()
        };
        let merged = service.update(&owner, Tier::Guest, &update).await.unwrap();
        assert_eq!(merged.projects.used, 1);

        let reloaded = service.load(&owner, Tier::Guest).await.unwrap();
        assert_eq!(reloaded, merged);
    }

    #[tokio::test]
    async fn test_remote_persist_failure_surfaces() {
        let service = offline_service();
        let owner = Owner::User("user_1".to_string());

        // Offline db: load falls back to defaults, but an explicit persist
        // must report failure.
        let usage = service.load(&owner, Tier::Pro).await.unwrap();
        assert_eq!(usage, Tier::Pro.default_limits());

        let result = service.persist(&owner, &usage).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}

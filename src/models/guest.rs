//! Anonymous guest session, kept in the local store until signup.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session age at which the UI should start prompting for signup.
pub const SIGNUP_PROMPT_AGE_MINUTES: i64 = 10;

/// Anonymous browser-local session. Not linked to any account until an
/// explicit migration copies its payload across.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GuestSession {
    /// Identity, prefixed `guest_`.
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    /// Refreshed on every read and mutation.
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub onboarding_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub project_data: Option<Value>,
}

impl GuestSession {
    /// Synthesize a fresh session with a new id and both timestamps at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: generate_guest_id(now),
            created_at: now,
            last_activity: now,
            onboarding_data: None,
            project_data: None,
        }
    }

    /// Whether the session carries any onboarding or project payload.
    pub fn has_payload(&self) -> bool {
        self.onboarding_data.is_some() || self.project_data.is_some()
    }

    /// True once the session carries payload or is at least
    /// [`SIGNUP_PROMPT_AGE_MINUTES`] whole minutes old.
    pub fn should_prompt_signup(&self, now: DateTime<Utc>) -> bool {
        self.has_payload() || (now - self.created_at).num_minutes() >= SIGNUP_PROMPT_AGE_MINUTES
    }

    /// Pure projection of the data handed to account creation.
    ///
    /// Does not clear the session; clearing is a separate explicit call the
    /// caller makes after a successful migration.
    pub fn migration_payload(&self) -> MigrationPayload {
        MigrationPayload {
            onboarding_data: self.onboarding_data.clone(),
            project_data: self.project_data.clone(),
        }
    }
}

/// Guest payload packaged for transfer into an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MigrationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub onboarding_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub project_data: Option<Value>,
}

/// Generate a guest id: millisecond timestamp plus a random URL-safe suffix.
///
/// Unique with very high probability within one store; collision is not a
/// condition callers handle.
pub fn generate_guest_id(now: DateTime<Utc>) -> String {
    let mut suffix = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut suffix);
    format!(
        "guest_{}_{}",
        now.timestamp_millis(),
        URL_SAFE_NO_PAD.encode(suffix)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_guest_id_shape() {
        let id = generate_guest_id(Utc::now());
        assert!(id.starts_with("guest_"));
        assert_ne!(id, generate_guest_id(Utc::now()));
    }

    #[test]
    fn test_should_prompt_signup_by_age() {
        let now = Utc::now();
        let session = GuestSession::new(now - Duration::minutes(11));
        assert!(session.should_prompt_signup(now));

        let session = GuestSession::new(now - Duration::minutes(5));
        assert!(!session.should_prompt_signup(now));
    }

    #[test]
    fn test_should_prompt_signup_by_payload() {
        let now = Utc::now();
        let mut session = GuestSession::new(now);
        assert!(!session.should_prompt_signup(now));

        session.project_data = Some(serde_json::json!({"title": "Draft one"}));
        assert!(session.should_prompt_signup(now));
    }

    #[test]
    fn test_migration_payload_leaves_session_intact() {
        let mut session = GuestSession::new(Utc::now());
        session.onboarding_data = Some(serde_json::json!({"genre": "mystery"}));

        let payload = session.migration_payload();
        assert_eq!(
            payload.onboarding_data,
            Some(serde_json::json!({"genre": "mystery"}))
        );
        assert!(session.onboarding_data.is_some());
    }
}

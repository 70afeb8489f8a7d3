// SPDX-License-Identifier: MIT

//! Guest session store and payload sanitizer.
//!
//! Sessions live in the local key-value store under a per-session key. The
//! lifecycle is `absent -> created -> active -> cleared`; a cleared session
//! is never resurrected. All local I/O is best-effort: a failed write loses
//! at worst the latest activity stamp, never the request.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::db::LocalStore;
use crate::models::GuestSession;

const SESSION_KEY_PREFIX: &str = "muse_guest_session_";

/// Partial guest session update. Supplied fields are shallow-merged over
/// the current session; payload blobs are sanitized before storage.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GuestSessionUpdate {
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub onboarding_data: Option<Value>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub project_data: Option<Value>,
}

/// Store for anonymous guest sessions.
#[derive(Clone)]
pub struct GuestSessionStore {
    store: Arc<LocalStore>,
}

impl GuestSessionStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    fn key(id: &str) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, id)
    }

    /// Read a session without touching it. Parse failures read as absent.
    pub fn get(&self, id: &str) -> Option<GuestSession> {
        let raw = self.store.get(&Self::key(id))?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(guest_id = id, error = %e, "Guest session unparseable, treating as absent");
                None
            }
        }
    }

    /// Return the existing session (refreshing `last_activity`), or
    /// synthesize a fresh one when absent or unparseable.
    pub fn get_or_create(&self, id: Option<&str>) -> GuestSession {
        let now = Utc::now();

        if let Some(mut session) = id.and_then(|id| self.get(id)) {
            session.last_activity = now;
            self.persist(&session);
            return session;
        }

        let session = GuestSession::new(now);
        tracing::debug!(guest_id = %session.id, "Created guest session");
        self.persist(&session);
        session
    }

    /// Shallow-merge an update over the current session, stamping
    /// `last_activity`. Creates a session first if none exists.
    pub fn update(&self, id: Option<&str>, update: GuestSessionUpdate) -> GuestSession {
        let mut session = self.get_or_create(id);

        if let Some(onboarding) = update.onboarding_data {
            session.onboarding_data = sanitize_for_persistence(&onboarding);
        }
        if let Some(project) = update.project_data {
            session.project_data = sanitize_for_persistence(&project);
        }
        session.last_activity = Utc::now();

        self.persist(&session);
        session
    }

    /// Remove a session. Terminal: there is no resurrection of a cleared id.
    pub fn clear(&self, id: &str) {
        self.store.remove(&Self::key(id));
        tracing::debug!(guest_id = id, "Cleared guest session");
    }

    /// Best-effort local write.
    fn persist(&self, session: &GuestSession) {
        match serde_json::to_string(session) {
            Ok(raw) => self.store.set(&Self::key(&session.id), &raw),
            Err(e) => {
                tracing::warn!(guest_id = %session.id, error = %e, "Guest session serialization failed")
            }
        }
    }
}

/// Strip framework-internal and environment markers from a payload before
/// it is serialized.
///
/// Keys prefixed `$$` mark a whole object as a framework handle: the object
/// is dropped entirely, not emptied. Keys prefixed `__` are dropped
/// field-wise. Arrays are sanitized element-wise and fully-dropped elements
/// are removed rather than left as holes. The result is always serializable
/// and sanitizing twice is a fixed point.
pub fn sanitize_for_persistence(value: &Value) -> Option<Value> {
    match value {
        Value::Object(map) => {
            if map.keys().any(|k| k.starts_with("$$")) {
                return None;
            }

            let mut out = Map::new();
            for (k, v) in map {
                if k.starts_with("__") {
                    continue;
                }
                if let Some(clean) = sanitize_for_persistence(v) {
                    out.insert(k.clone(), clean);
                }
            }
            Some(Value::Object(out))
        }
        Value::Array(items) => Some(Value::Array(
            items.iter().filter_map(sanitize_for_persistence).collect(),
        )),
        other => Some(other.clone()),
    }
}

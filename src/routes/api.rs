// SPDX-License-Identifier: MIT

//! API routes: profile, usage, feature availability, guest migration.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, Identity, GUEST_COOKIE};
use crate::models::tier::{can_use_feature, check_feature_access, upgrade_required};
use crate::models::{Feature, FeatureAccess, Tier, UsageLimits, UsageUpdate, UserProfile};
use crate::services::guest::GuestSessionUpdate;
use crate::services::usage::Owner;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes open to guests and accounts alike. The identity middleware
/// is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/usage", get(get_usage).post(post_usage))
        .route("/api/features/{feature}", get(get_feature))
        .route("/api/guest/session", put(put_guest_session))
}

/// Account routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn account_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/account/migrate", post(post_migrate))
}

/// The requester's resolved owner key and tier.
///
/// Guests resolve through the local session store (creating a session on
/// first touch); accounts resolve their tier through billing via the
/// profile service.
struct RequestOwner {
    owner: Owner,
    tier: Tier,
}

async fn resolve_owner(state: &AppState, identity: &Identity) -> Result<RequestOwner> {
    match identity {
        Identity::User(user) => {
            let profile = state.profile_service.get_profile(&user.user_id).await?;
            Ok(RequestOwner {
                owner: Owner::User(user.user_id.clone()),
                tier: profile.tier,
            })
        }
        Identity::Guest(id) => {
            let session = state.guest_sessions.get_or_create(Some(id));
            Ok(RequestOwner {
                owner: Owner::Guest(session.id),
                tier: Tier::Guest,
            })
        }
        Identity::Anonymous => {
            let session = state.guest_sessions.get_or_create(None);
            Ok(RequestOwner {
                owner: Owner::Guest(session.id),
                tier: Tier::Guest,
            })
        }
    }
}

fn guest_cookie(id: &str) -> Cookie<'static> {
    Cookie::build((GUEST_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Pin a guest owner's session id via cookie.
///
/// `resolve_owner` synthesizes a fresh session when the presented id is
/// unknown; without this the client keeps its stale id and every write
/// lands under a new orphan owner.
fn pin_guest(jar: CookieJar, owner: &Owner) -> CookieJar {
    match owner {
        Owner::Guest(id) => jar.add(guest_cookie(id)),
        Owner::User(_) => jar,
    }
}

// ─── Profile ─────────────────────────────────────────────────

/// Reconciled profile view returned to the UI.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub usage: UsageLimits,
    pub features: FeatureAccess,
    /// Whether the UI should prompt a guest to sign up. Always false for
    /// account owners.
    pub prompt_signup: bool,
}

/// Get the requester's profile with reconciled usage and feature flags.
///
/// Anonymous requests get a guest session synthesized and pinned via a
/// cookie so subsequent calls return the same identity.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ProfileResponse>)> {
    match identity {
        Identity::User(user) => {
            let profile = state.profile_service.get_profile(&user.user_id).await?;
            let owner = Owner::User(user.user_id.clone());
            let usage = state.usage_service.load(&owner, profile.tier).await?;
            let features = profile.tier.features();
            Ok((
                jar,
                Json(ProfileResponse {
                    profile,
                    usage,
                    features,
                    prompt_signup: false,
                }),
            ))
        }
        Identity::Guest(id) => guest_profile(&state, jar, Some(&id)).await,
        Identity::Anonymous => guest_profile(&state, jar, None).await,
    }
}

async fn guest_profile(
    state: &AppState,
    jar: CookieJar,
    id: Option<&str>,
) -> Result<(CookieJar, Json<ProfileResponse>)> {
    let session = state.guest_sessions.get_or_create(id);
    let owner = Owner::Guest(session.id.clone());
    let usage = state.usage_service.load(&owner, Tier::Guest).await?;

    let prompt_signup = session.should_prompt_signup(chrono::Utc::now());
    let jar = jar.add(guest_cookie(&session.id));
    let profile = UserProfile::guest(&session);

    Ok((
        jar,
        Json(ProfileResponse {
            profile,
            usage,
            features: Tier::Guest.features(),
            prompt_signup,
        }),
    ))
}

// ─── Usage ───────────────────────────────────────────────────

/// Get the requester's usage row (created from tier defaults on first read).
async fn get_usage(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<UsageLimits>)> {
    let ctx = resolve_owner(&state, &identity).await?;
    let usage = state.usage_service.load(&ctx.owner, ctx.tier).await?;
    Ok((pin_guest(jar, &ctx.owner), Json(usage)))
}

/// Apply a partial usage update and return the merged row.
///
/// A failed remote persist is reported as a failed request, never as
/// success with stale data.
async fn post_usage(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Json(update): Json<UsageUpdate>,
) -> Result<(CookieJar, Json<UsageLimits>)> {
    let ctx = resolve_owner(&state, &identity).await?;
    let merged = state
        .usage_service
        .update(&ctx.owner, ctx.tier, &update)
        .await?;
    Ok((pin_guest(jar, &ctx.owner), Json(merged)))
}

// ─── Feature Availability ────────────────────────────────────

/// Availability of one feature for the requester.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeatureResponse {
    pub feature: Feature,
    pub tier: Tier,
    /// Tier gate and meter combined.
    pub allowed: bool,
    /// Lowest tier whose flag row enables the feature, when the current
    /// tier's does not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_tier: Option<Tier>,
    pub upgrade_required: bool,
}

/// Check whether the requester can use a feature right now.
async fn get_feature(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(feature): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<FeatureResponse>)> {
    let feature = Feature::parse(&feature)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown feature: {}", feature)))?;

    let ctx = resolve_owner(&state, &identity).await?;
    let usage = state.usage_service.load(&ctx.owner, ctx.tier).await?;
    let allowed = can_use_feature(ctx.tier, &usage, feature);

    let required_tier = if check_feature_access(ctx.tier, feature) {
        None
    } else {
        [Tier::Free, Tier::Pro, Tier::Team]
            .into_iter()
            .find(|t| check_feature_access(*t, feature))
    };

    Ok((
        pin_guest(jar, &ctx.owner),
        Json(FeatureResponse {
            feature,
            tier: ctx.tier,
            allowed,
            required_tier,
            upgrade_required: required_tier
                .map(|t| upgrade_required(ctx.tier, t))
                .unwrap_or(false),
        }),
    ))
}

// ─── Guest Session ───────────────────────────────────────────

/// Update the requester's guest session payload.
///
/// Payload blobs are sanitized before persistence; `last_activity` is
/// stamped. Creates a session if the presented id is missing.
async fn put_guest_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
    Json(update): Json<GuestSessionUpdate>,
) -> Result<(CookieJar, Json<crate::models::GuestSession>)> {
    let id = match &identity {
        Identity::User(_) => {
            return Err(AppError::BadRequest(
                "Guest session updates require a guest identity".to_string(),
            ))
        }
        Identity::Guest(id) => Some(id.as_str()),
        Identity::Anonymous => None,
    };

    let session = state.guest_sessions.update(id, update);
    let jar = jar.add(guest_cookie(&session.id));
    Ok((jar, Json(session)))
}

// ─── Migration ───────────────────────────────────────────────

/// Request body for guest-to-account migration.
#[derive(Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MigrateRequest {
    pub guest_session_id: String,
}

/// Response for guest-to-account migration.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MigrateResponse {
    pub success: bool,
    pub migrated_onboarding: bool,
    pub migrated_project: bool,
}

/// Migrate a guest session's payload into the signed-in account.
///
/// The guest session is cleared only after the payload has persisted; a
/// failed persist leaves the session intact for retry.
async fn post_migrate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Json(request): Json<MigrateRequest>,
) -> Result<(CookieJar, Json<MigrateResponse>)> {
    let session = state
        .guest_sessions
        .get(&request.guest_session_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("Guest session {}", request.guest_session_id))
        })?;

    let payload = state
        .profile_service
        .migrate_guest(&user.user_id, &session)
        .await?;

    // Persist succeeded: the session and its usage row can go.
    state.guest_sessions.clear(&session.id);
    state.usage_service.clear_local(&session.id);
    // Removal attributes must match the creation attributes.
    let jar = jar.remove(Cookie::build((GUEST_COOKIE, "")).path("/").build());

    Ok((
        jar,
        Json(MigrateResponse {
            success: true,
            migrated_onboarding: payload.onboarding_data.is_some(),
            migrated_project: payload.project_data.is_some(),
        }),
    ))
}

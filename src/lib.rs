// SPDX-License-Identifier: MIT

//! MUSE usage & entitlements API.
//!
//! This crate reconciles per-owner usage counters against tier-defined
//! quotas, gates features by subscription tier, and keeps anonymous guest
//! sessions until they are migrated into an account.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{GuestSessionStore, ProfileService, UsageService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub guest_sessions: GuestSessionStore,
    pub usage_service: UsageService,
    pub profile_service: ProfileService,
}

// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod guest;
pub mod profile;
pub mod tier;
pub mod usage;

pub use guest::{GuestSession, MigrationPayload};
pub use profile::{SubscriptionStatus, UserProfile};
pub use tier::{Feature, FeatureAccess, Tier};
pub use usage::{CounterUpdate, UsageCounter, UsageLimits, UsageUpdate};

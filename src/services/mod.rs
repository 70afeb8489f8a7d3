// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod billing;
pub mod guest;
pub mod profile;
pub mod usage;

pub use billing::{BillingClient, SubscriptionInfo};
pub use guest::{sanitize_for_persistence, GuestSessionStore, GuestSessionUpdate};
pub use profile::ProfileService;
pub use usage::{Owner, UsageService};

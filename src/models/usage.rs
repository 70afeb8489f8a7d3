//! Usage counters and the partial-update merge.
//!
//! A usage row is four independent `(used, limit, unlimited)` counters. An
//! update supplies whole counters; `merge` replaces a supplied counter
//! wholesale and leaves omitted counters untouched. Merging returns the new
//! row instead of mutating shared state so callers stay testable.

use serde::{Deserialize, Serialize};

/// One consumption counter against a quota.
///
/// `limit` is advisory when `unlimited` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsageCounter {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub used: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub limit: u64,
    pub unlimited: bool,
}

impl UsageCounter {
    /// A fresh metered counter with nothing consumed.
    pub fn metered(limit: u64) -> Self {
        Self {
            used: 0,
            limit,
            unlimited: false,
        }
    }

    /// A fresh unmetered counter.
    pub fn unlimited() -> Self {
        Self {
            used: 0,
            limit: 0,
            unlimited: true,
        }
    }

    /// Whether further consumption is allowed.
    pub fn has_remaining(&self) -> bool {
        self.unlimited || self.used < self.limit
    }
}

/// Per-owner usage row: consumption against tier quotas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsageLimits {
    #[serde(default)]
    pub arc_analyses: UsageCounter,
    #[serde(default)]
    pub projects: UsageCounter,
    #[serde(default)]
    pub exports: UsageCounter,
    #[serde(default)]
    pub storage_bytes: UsageCounter,
}

/// One counter in an update request.
///
/// All three fields are required: an update always replaces the full
/// triple, so a caller cannot reset `limit` or `unlimited` by accident.
/// `used` is accepted signed and clamped to zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CounterUpdate {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub used: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub limit: u64,
    pub unlimited: bool,
}

impl CounterUpdate {
    /// The validated counter this update resolves to.
    pub fn clamped(&self) -> UsageCounter {
        UsageCounter {
            used: self.used.max(0) as u64,
            limit: self.limit,
            unlimited: self.unlimited,
        }
    }
}

/// Partial usage update. Omitted counters are left unchanged by `merge`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arc_analyses: Option<CounterUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<CounterUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<CounterUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bytes: Option<CounterUpdate>,
}

impl UsageLimits {
    /// Apply a partial update, returning the merged row.
    ///
    /// Supplied counters replace the stored triple wholesale; omitted
    /// counters are returned unchanged. Never fails.
    pub fn merge(&self, update: &UsageUpdate) -> UsageLimits {
        fn pick(current: UsageCounter, update: Option<CounterUpdate>) -> UsageCounter {
            update.map(|u| u.clamped()).unwrap_or(current)
        }

        UsageLimits {
            arc_analyses: pick(self.arc_analyses, update.arc_analyses),
            projects: pick(self.projects, update.projects),
            exports: pick(self.exports, update.exports),
            storage_bytes: pick(self.storage_bytes, update.storage_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_replaces_supplied_counter_wholesale() {
        let current = UsageLimits {
            arc_analyses: UsageCounter {
                used: 2,
                limit: 10,
                unlimited: false,
            },
            ..Default::default()
        };

        let update = UsageUpdate {
            arc_analyses: Some(CounterUpdate {
                used: 3,
                limit: 20,
                unlimited: true,
            }),
            ..Default::default()
        };

        let merged = current.merge(&update);
        assert_eq!(
            merged.arc_analyses,
            UsageCounter {
                used: 3,
                limit: 20,
                unlimited: true
            }
        );
    }

    #[test]
    fn test_merge_leaves_omitted_counters_unchanged() {
        let current = UsageLimits {
            projects: UsageCounter {
                used: 1,
                limit: 3,
                unlimited: false,
            },
            exports: UsageCounter {
                used: 4,
                limit: 5,
                unlimited: false,
            },
            ..Default::default()
        };

        let merged = current.merge(&UsageUpdate::default());
        assert_eq!(merged, current);
    }

    #[test]
    fn test_merge_clamps_negative_used_to_zero() {
        let current = UsageLimits::default();
        let update = UsageUpdate {
            exports: Some(CounterUpdate {
                used: -7,
                limit: 5,
                unlimited: false,
            }),
            ..Default::default()
        };

        let merged = current.merge(&update);
        assert_eq!(merged.exports.used, 0);
        assert_eq!(merged.exports.limit, 5);
    }

    #[test]
    fn test_partial_counter_shape_is_rejected() {
        // A counter update without all three fields is a validation error,
        // caught at deserialization.
        let result: Result<UsageUpdate, _> =
            serde_json::from_str(r#"{"arc_analyses": {"used": 5}}"#);
        assert!(result.is_err());
    }
}

//! Subscription tiers, feature flags, and per-tier quota defaults.
//!
//! The tier order, the feature table, and the usage-limit defaults all key
//! off the single `Tier` enum so they cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::models::usage::{UsageCounter, UsageLimits};

/// Subscription tier. Declaration order is the upgrade order:
/// `Guest < Free < Pro < Team`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Anonymous browser-local session. Unknown tier strings also land here.
    #[default]
    Guest,
    Free,
    Pro,
    Team,
}

/// Deserializes through [`Tier::parse`] so unknown tier strings fail
/// closed to `Guest` while `Guest` stays first for the upgrade order.
impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Tier::parse(&s))
    }
}

impl Tier {
    /// Parse a tier string, failing closed to `Guest` on anything unknown.
    pub fn parse(s: &str) -> Tier {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Tier::Free,
            "pro" => Tier::Pro,
            "team" => Tier::Team,
            _ => Tier::Guest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Guest => "guest",
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Team => "team",
        }
    }

    /// Feature-flag row for this tier.
    pub fn features(&self) -> FeatureAccess {
        match self {
            Tier::Guest => FeatureAccess {
                arc_analysis: true,
                advanced_insights: false,
                exports: false,
                collaboration: false,
                custom_templates: false,
                priority_support: false,
            },
            Tier::Free => FeatureAccess {
                arc_analysis: true,
                advanced_insights: false,
                exports: true,
                collaboration: false,
                custom_templates: false,
                priority_support: false,
            },
            Tier::Pro => FeatureAccess {
                arc_analysis: true,
                advanced_insights: true,
                exports: true,
                collaboration: false,
                custom_templates: true,
                priority_support: true,
            },
            Tier::Team => FeatureAccess {
                arc_analysis: true,
                advanced_insights: true,
                exports: true,
                collaboration: true,
                custom_templates: true,
                priority_support: true,
            },
        }
    }

    /// Default usage quotas for this tier. A new usage row starts here.
    pub fn default_limits(&self) -> UsageLimits {
        match self {
            Tier::Guest => UsageLimits {
                arc_analyses: UsageCounter::metered(3),
                projects: UsageCounter::metered(1),
                exports: UsageCounter::metered(0),
                storage_bytes: UsageCounter::metered(50 * 1024 * 1024),
            },
            Tier::Free => UsageLimits {
                arc_analyses: UsageCounter::metered(10),
                projects: UsageCounter::metered(3),
                exports: UsageCounter::metered(5),
                storage_bytes: UsageCounter::metered(500 * 1024 * 1024),
            },
            Tier::Pro => UsageLimits {
                arc_analyses: UsageCounter::unlimited(),
                projects: UsageCounter::metered(25),
                exports: UsageCounter::unlimited(),
                storage_bytes: UsageCounter::metered(10 * 1024 * 1024 * 1024),
            },
            Tier::Team => UsageLimits {
                arc_analyses: UsageCounter::unlimited(),
                projects: UsageCounter::unlimited(),
                exports: UsageCounter::unlimited(),
                storage_bytes: UsageCounter::metered(100 * 1024 * 1024 * 1024),
            },
        }
    }
}

/// Gated product capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ArcAnalysis,
    Projects,
    Exports,
    Storage,
    AdvancedInsights,
    Collaboration,
    CustomTemplates,
    PrioritySupport,
}

impl Feature {
    /// Parse a feature path segment (e.g. `arc_analysis`).
    pub fn parse(s: &str) -> Option<Feature> {
        match s {
            "arc_analysis" => Some(Feature::ArcAnalysis),
            "projects" => Some(Feature::Projects),
            "exports" => Some(Feature::Exports),
            "storage" => Some(Feature::Storage),
            "advanced_insights" => Some(Feature::AdvancedInsights),
            "collaboration" => Some(Feature::Collaboration),
            "custom_templates" => Some(Feature::CustomTemplates),
            "priority_support" => Some(Feature::PrioritySupport),
            _ => None,
        }
    }
}

/// Boolean capability flags for one tier. Configuration data, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeatureAccess {
    pub arc_analysis: bool,
    pub advanced_insights: bool,
    pub exports: bool,
    pub collaboration: bool,
    pub custom_templates: bool,
    pub priority_support: bool,
}

impl FeatureAccess {
    /// Whether this tier's flag row enables a feature at all.
    ///
    /// Projects and storage have no flag; they are governed by meters only.
    pub fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::ArcAnalysis => self.arc_analysis,
            Feature::Projects | Feature::Storage => true,
            Feature::Exports => self.exports,
            Feature::AdvancedInsights => self.advanced_insights,
            Feature::Collaboration => self.collaboration,
            Feature::CustomTemplates => self.custom_templates,
            Feature::PrioritySupport => self.priority_support,
        }
    }
}

/// Pure tier-table lookup: is `feature` enabled for `tier`?
pub fn check_feature_access(tier: Tier, feature: Feature) -> bool {
    tier.features().allows(feature)
}

/// Feature gate including the usage meter.
///
/// False when the tier disables the feature. For metered features
/// (analyses, projects, exports) also false once `used >= limit`, unless
/// the counter is unlimited. Storage is advisory only and never hard-blocks.
pub fn can_use_feature(tier: Tier, usage: &UsageLimits, feature: Feature) -> bool {
    if !check_feature_access(tier, feature) {
        return false;
    }

    let counter = match feature {
        Feature::ArcAnalysis => &usage.arc_analyses,
        Feature::Projects => &usage.projects,
        Feature::Exports => &usage.exports,
        _ => return true,
    };

    counter.has_remaining()
}

/// True when moving from `current` to `target` is an upgrade.
pub fn upgrade_required(current: Tier, target: Tier) -> bool {
    current < target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order() {
        assert!(Tier::Guest < Tier::Free);
        assert!(Tier::Free < Tier::Pro);
        assert!(Tier::Pro < Tier::Team);
    }

    #[test]
    fn test_unknown_tier_fails_closed() {
        assert_eq!(Tier::parse("enterprise"), Tier::Guest);
        assert_eq!(Tier::parse(""), Tier::Guest);
        assert_eq!(Tier::parse("PRO"), Tier::Pro);

        let parsed: Tier = serde_json::from_str("\"platinum\"").unwrap();
        assert_eq!(parsed, Tier::Guest);
    }

    #[test]
    fn test_upgrade_required() {
        assert!(upgrade_required(Tier::Guest, Tier::Free));
        assert!(!upgrade_required(Tier::Pro, Tier::Free));
        assert!(!upgrade_required(Tier::Team, Tier::Team));
    }

    #[test]
    fn test_storage_never_hard_blocks() {
        let mut usage = Tier::Free.default_limits();
        usage.storage_bytes.used = usage.storage_bytes.limit + 1;
        assert!(can_use_feature(Tier::Free, &usage, Feature::Storage));
    }

    #[test]
    fn test_metered_feature_exhaustion() {
        let mut usage = Tier::Free.default_limits();
        usage.arc_analyses.used = usage.arc_analyses.limit;
        assert!(!can_use_feature(Tier::Free, &usage, Feature::ArcAnalysis));

        usage.arc_analyses.used = usage.arc_analyses.limit - 1;
        assert!(can_use_feature(Tier::Free, &usage, Feature::ArcAnalysis));

        usage.arc_analyses.unlimited = true;
        usage.arc_analyses.used = usage.arc_analyses.limit + 100;
        assert!(can_use_feature(Tier::Free, &usage, Feature::ArcAnalysis));
    }

    #[test]
    fn test_disabled_feature_ignores_meter() {
        let usage = Tier::Guest.default_limits();
        assert!(!can_use_feature(Tier::Guest, &usage, Feature::Exports));
        assert!(!can_use_feature(
            Tier::Free,
            &usage,
            Feature::AdvancedInsights
        ));
    }
}

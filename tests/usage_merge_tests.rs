// SPDX-License-Identifier: MIT

//! Merge semantics for usage updates.

use muse_usage::models::{CounterUpdate, Tier, UsageCounter, UsageLimits, UsageUpdate};

#[test]
fn test_merge_never_loses_supplied_used_value() {
    let current = Tier::Free.default_limits();

    for used in [0i64, 1, 7, 10_000] {
        let update = UsageUpdate {
            arc_analyses: Some(CounterUpdate {
                used,
                limit: 10,
                unlimited: false,
            }),
            ..Default::default()
        };
        let merged = current.merge(&update);
        assert_eq!(merged.arc_analyses.used, used as u64);
    }
}

#[test]
fn test_omitted_counters_are_bit_identical() {
    let current = UsageLimits {
        arc_analyses: UsageCounter {
            used: 9,
            limit: 10,
            unlimited: false,
        },
        projects: UsageCounter {
            used: 2,
            limit: 3,
            unlimited: false,
        },
        exports: UsageCounter {
            used: 0,
            limit: 0,
            unlimited: true,
        },
        storage_bytes: UsageCounter {
            used: 123_456,
            limit: 1_000_000,
            unlimited: false,
        },
    };

    let update = UsageUpdate {
        projects: Some(CounterUpdate {
            used: 3,
            limit: 3,
            unlimited: false,
        }),
        ..Default::default()
    };

    let merged = current.merge(&update);
    assert_eq!(merged.arc_analyses, current.arc_analyses);
    assert_eq!(merged.exports, current.exports);
    assert_eq!(merged.storage_bytes, current.storage_bytes);
    assert_eq!(merged.projects.used, 3);
}

#[test]
fn test_negative_used_is_stored_as_zero() {
    let merged = UsageLimits::default().merge(&UsageUpdate {
        storage_bytes: Some(CounterUpdate {
            used: -1,
            limit: 100,
            unlimited: false,
        }),
        ..Default::default()
    });
    assert_eq!(merged.storage_bytes.used, 0);

    let merged = UsageLimits::default().merge(&UsageUpdate {
        storage_bytes: Some(CounterUpdate {
            used: i64::MIN,
            limit: 100,
            unlimited: false,
        }),
        ..Default::default()
    });
    assert_eq!(merged.storage_bytes.used, 0);
}

#[test]
fn test_supplied_counter_replaces_wholesale() {
    // Supplying a counter replaces limit and unlimited too, not just used.
    let current = UsageLimits {
        exports: UsageCounter {
            used: 2,
            limit: 5,
            unlimited: false,
        },
        ..Default::default()
    };

    let merged = current.merge(&UsageUpdate {
        exports: Some(CounterUpdate {
            used: 2,
            limit: 0,
            unlimited: true,
        }),
        ..Default::default()
    });

    assert!(merged.exports.unlimited);
    assert_eq!(merged.exports.limit, 0);
}

#[test]
fn test_merge_is_pure() {
    let current = Tier::Pro.default_limits();
    let snapshot = current.clone();

    let _ = current.merge(&UsageUpdate {
        projects: Some(CounterUpdate {
            used: 20,
            limit: 25,
            unlimited: false,
        }),
        ..Default::default()
    });

    assert_eq!(current, snapshot);
}

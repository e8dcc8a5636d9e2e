//! Tests for the Registry store
//!
//! These tests verify:
//! - Registration validation and uniqueness
//! - Strictly rising mileage
//! - Owner changes
//! - Sorted listings and prefix search
//! - Plate normalization
//! - Concurrent updates keep the invariants

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use carreg::{Registry, RegistryError};

// =============================================================================
// Helper Functions
// =============================================================================

fn registry_with(plates: &[&str]) -> Registry {
    let registry = Registry::new();
    for plate in plates {
        registry.register(plate, 4, 0, "Owner").unwrap();
    }
    registry
}

// =============================================================================
// Registration Tests
// =============================================================================

#[test]
fn test_register_then_get() {
    let registry = Registry::new();
    registry.register("ABC123", 4, 100, "Alice").unwrap();

    let car = registry.get("ABC123").unwrap();
    assert_eq!(car.seats(), 4);
    assert_eq!(car.mileage(), 100);
    assert_eq!(car.owner(), "Alice");
}

#[test]
fn test_register_duplicate_leaves_record_untouched() {
    let registry = Registry::new();
    registry.register("ABC123", 4, 100, "Alice").unwrap();

    let err = registry.register("ABC123", 7, 5, "Mallory").unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateLicence));

    let car = registry.get("ABC123").unwrap();
    assert_eq!((car.seats(), car.mileage(), car.owner()), (4, 100, "Alice"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_register_duplicate_differs_only_in_case() {
    let registry = Registry::new();
    registry.register("abc123", 4, 100, "Alice").unwrap();

    let err = registry.register("ABC123", 4, 100, "Bob").unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateLicence));
}

#[test]
fn test_register_empty_licence() {
    let err = Registry::new().register("", 4, 0, "Alice").unwrap_err();
    assert!(matches!(err, RegistryError::EmptyLicence));
}

#[test]
fn test_register_invalid_seats() {
    let registry = Registry::new();
    for seats in [-1, 0, 1, 3, 10, 256, i64::MAX] {
        let err = registry.register("ABC123", seats, 0, "Alice").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSeats(s) if s == seats));
    }
    assert!(registry.is_empty());
}

#[test]
fn test_register_every_valid_seat_count() {
    let registry = Registry::new();
    for seats in [2, 4, 5, 6, 7, 8, 9] {
        registry
            .register(&format!("SEATS{}", seats), seats, 0, "Alice")
            .unwrap();
    }
    assert_eq!(registry.len(), 7);
}

#[test]
fn test_register_negative_mileage() {
    let err = Registry::new().register("ABC123", 4, -1, "Alice").unwrap_err();
    assert!(matches!(err, RegistryError::NegativeValue));
}

#[test]
fn test_register_empty_owner() {
    let err = Registry::new().register("ABC123", 4, 0, "").unwrap_err();
    assert!(matches!(err, RegistryError::EmptyOwner));
}

#[test]
fn test_register_validation_order() {
    // Empty licence is reported before bad seats, seats before mileage, ...
    let registry = Registry::new();
    assert!(matches!(
        registry.register("", 3, -1, "").unwrap_err(),
        RegistryError::EmptyLicence
    ));
    assert!(matches!(
        registry.register("X", 3, -1, "").unwrap_err(),
        RegistryError::InvalidSeats(3)
    ));
    assert!(matches!(
        registry.register("X", 4, -1, "").unwrap_err(),
        RegistryError::NegativeValue
    ));
    assert!(matches!(
        registry.register("X", 4, 0, "").unwrap_err(),
        RegistryError::EmptyOwner
    ));
}

// =============================================================================
// Mileage Tests
// =============================================================================

#[test]
fn test_update_mileage_increase() {
    let registry = registry_with(&["ABC123"]);
    registry.update_mileage("ABC123", 500).unwrap();
    assert_eq!(registry.get("ABC123").unwrap().mileage(), 500);
}

#[test]
fn test_update_mileage_rollback_rejected() {
    let registry = Registry::new();
    registry.register("ABC123", 4, 100, "Alice").unwrap();

    let err = registry.update_mileage("ABC123", 50).unwrap_err();
    assert!(matches!(err, RegistryError::OdometerRollback));
    assert_eq!(registry.get("ABC123").unwrap().mileage(), 100);
}

#[test]
fn test_update_mileage_equal_rejected() {
    let registry = Registry::new();
    registry.register("ABC123", 4, 100, "Alice").unwrap();

    let err = registry.update_mileage("ABC123", 100).unwrap_err();
    assert!(matches!(err, RegistryError::OdometerRollback));
}

#[test]
fn test_update_mileage_negative() {
    let registry = registry_with(&["ABC123"]);
    let err = registry.update_mileage("ABC123", -5).unwrap_err();
    assert!(matches!(err, RegistryError::NegativeValue));
}

#[test]
fn test_update_mileage_negative_checked_before_lookup() {
    let err = Registry::new().update_mileage("NOPE", -5).unwrap_err();
    assert!(matches!(err, RegistryError::NegativeValue));
}

#[test]
fn test_update_mileage_unknown_plate() {
    let err = Registry::new().update_mileage("NOPE", 5).unwrap_err();
    assert!(matches!(err, RegistryError::NotFound));
}

#[test]
fn test_mileage_sequence_is_non_decreasing() {
    let registry = registry_with(&["ABC123"]);
    let readings = [10, 5, 20, 20, 19, 300, 299, 301, 0, 1000];

    let mut highest = 0u64;
    for reading in readings {
        let result = registry.update_mileage("ABC123", reading);
        let current = registry.get("ABC123").unwrap().mileage();

        if reading as u64 > highest {
            assert!(result.is_ok());
            highest = reading as u64;
        } else {
            assert!(matches!(result, Err(RegistryError::OdometerRollback)));
        }
        assert_eq!(current, highest);
    }
}

// =============================================================================
// Owner Tests
// =============================================================================

#[test]
fn test_update_owner() {
    let registry = registry_with(&["ABC123"]);
    registry.update_owner("abc123", "Jack Lemon").unwrap();

    let car = registry.get("ABC123").unwrap();
    assert_eq!(car.owner(), "Jack Lemon");
    assert_eq!(car.seats(), 4);
}

#[test]
fn test_update_owner_empty() {
    let registry = registry_with(&["ABC123"]);
    let err = registry.update_owner("ABC123", "").unwrap_err();
    assert!(matches!(err, RegistryError::EmptyOwner));
    assert_eq!(registry.get("ABC123").unwrap().owner(), "Owner");
}

#[test]
fn test_update_owner_unknown_plate() {
    let err = Registry::new().update_owner("NOPE", "Alice").unwrap_err();
    assert!(matches!(err, RegistryError::NotFound));
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_get_unknown_plate() {
    let err = Registry::new().get("NOPE").unwrap_err();
    assert!(matches!(err, RegistryError::NotFound));
    assert_eq!(err.to_string(), "This licence is not registered");
}

#[test]
fn test_get_returns_a_copy() {
    let registry = registry_with(&["ABC123"]);
    let before = registry.get("ABC123").unwrap();
    registry.update_mileage("ABC123", 99).unwrap();

    assert_eq!(before.mileage(), 0);
    assert_eq!(registry.get("ABC123").unwrap().mileage(), 99);
}

#[test]
fn test_list_sorted() {
    let registry = registry_with(&["ZZZ 1", "AAA 1", "mmm 1", "123"]);
    assert_eq!(
        registry.list().unwrap(),
        vec!["123", "AAA 1", "MMM 1", "ZZZ 1"]
    );
}

#[test]
fn test_list_empty_registry() {
    let err = Registry::new().list().unwrap_err();
    assert!(matches!(err, RegistryError::EmptyRegistry));
    assert_eq!(err.to_string(), "No have cars in base");
}

// =============================================================================
// Prefix Search Tests
// =============================================================================

#[test]
fn test_prefix_search_scenario() {
    let registry = Registry::new();
    registry.register("ABC123", 4, 100, "Alice").unwrap();

    assert_eq!(registry.prefix_search("AB"), vec!["ABC123"]);
    assert!(registry.prefix_search("ZZ").is_empty());
}

#[test]
fn test_prefix_search_empty_prefix_returns_all() {
    let registry = registry_with(&["B1", "A1", "C1"]);
    assert_eq!(registry.prefix_search(""), vec!["A1", "B1", "C1"]);
}

#[test]
fn test_prefix_search_case_insensitive() {
    let registry = registry_with(&["HMR-299", "HGD-498", "HVP 283"]);
    assert_eq!(registry.prefix_search("h"), vec!["HGD-498", "HMR-299", "HVP 283"]);
    assert_eq!(registry.prefix_search("hm"), vec!["HMR-299"]);
}

#[test]
fn test_prefix_search_matches_linear_scan() {
    let plates = [
        "A", "AB", "ABC", "ABD", "AC", "B", "BA", "BAA", "1H1890C", "174-WWA", "1A US923",
        "215 MZN", "2-4JHJ", "A04 4HE", "A37 4791",
    ];
    let registry = registry_with(&plates);
    let all: BTreeSet<String> = plates.iter().map(|p| p.to_string()).collect();

    for prefix in ["", "A", "AB", "ABC", "ABCD", "B", "BA", "1", "1A", "2-", "A0", "Z", "AA"] {
        let expected: Vec<String> = all
            .iter()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect();
        assert_eq!(registry.prefix_search(prefix), expected, "prefix {:?}", prefix);
    }
}

#[test]
fn test_prefix_search_empty_registry() {
    assert!(Registry::new().prefix_search("A").is_empty());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_mileage_updates_same_plate() {
    let registry = Arc::new(registry_with(&["ABC123"]));
    let readings: Vec<i64> = (1..=200).map(|n| n * 10).collect();

    let handles: Vec<_> = readings
        .chunks(25)
        .map(|chunk| {
            // Each thread submits its share in reverse to shake up ordering
            let chunk: Vec<i64> = chunk.iter().rev().copied().collect();
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut applied = Vec::new();
                for reading in chunk {
                    if registry.update_mileage("ABC123", reading).is_ok() {
                        applied.push(reading);
                    }
                }
                applied
            })
        })
        .collect();

    let applied: Vec<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let highest_applied = *applied.iter().max().unwrap();
    let final_mileage = registry.get("ABC123").unwrap().mileage() as i64;

    assert_eq!(final_mileage, highest_applied);
    // The largest reading can never be rejected.
    assert_eq!(final_mileage, 2000);
}

#[test]
fn test_concurrent_registrations_same_plate() {
    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register("RACE 1", 4, i, &format!("Owner {}", i)).is_ok())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_concurrent_updates_different_plates() {
    let plates: Vec<String> = (0..8).map(|i| format!("CAR {}", i)).collect();
    let registry = Arc::new(Registry::new());
    for plate in &plates {
        registry.register(plate, 5, 0, "Fleet").unwrap();
    }

    let handles: Vec<_> = plates
        .iter()
        .cloned()
        .map(|plate| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for reading in 1..=100 {
                    registry.update_mileage(&plate, reading).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for plate in &plates {
        assert_eq!(registry.get(plate).unwrap().mileage(), 100);
    }
}

//! Registry store
//!
//! BTreeMap-based store behind a single parking_lot Mutex.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::Mutex;

use super::CarRecord;
use crate::error::{RegistryError, Result};

/// Seat counts a new registration may declare
pub const VALID_SEATS: [u8; 7] = [2, 4, 5, 6, 7, 8, 9];

/// Canonical form of a plate (and of a plate prefix)
pub fn normalize_plate(plate: &str) -> String {
    plate.to_uppercase()
}

/// The shared registry of cars, keyed by plate
///
/// ## Concurrency:
/// - `cars`: one exclusive lock for every operation, read or write
/// - The lock is held only for the in-memory work, never across I/O
/// - Reads return owned copies
#[derive(Debug)]
pub struct Registry {
    cars: Mutex<BTreeMap<String, CarRecord>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::from_records(BTreeMap::new())
    }

    /// Create a registry from existing records
    ///
    /// Keys are normalized. If two keys collapse into the same plate the
    /// later one (in key order) wins.
    pub fn from_records(records: BTreeMap<String, CarRecord>) -> Self {
        let cars = records
            .into_iter()
            .map(|(plate, car)| (normalize_plate(&plate), car))
            .collect();
        Self {
            cars: Mutex::new(cars),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All plates in sorted order
    ///
    /// An empty registry is reported as `EmptyRegistry`.
    pub fn list(&self) -> Result<Vec<String>> {
        let cars = self.cars.lock();
        if cars.is_empty() {
            return Err(RegistryError::EmptyRegistry);
        }
        Ok(cars.keys().cloned().collect())
    }

    /// Plates starting with `prefix`, in sorted order
    ///
    /// Seeks to the leftmost key not less than `prefix`, then walks forward
    /// while keys share the prefix: O(log n + k) for k matches. The empty
    /// prefix matches every plate.
    pub fn prefix_search(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize_plate(prefix);
        let cars = self.cars.lock();

        cars.range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .map(|(plate, _)| plate)
            .take_while(|plate| plate.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Copy of the record registered under `plate`
    pub fn get(&self, plate: &str) -> Result<CarRecord> {
        let plate = normalize_plate(plate);
        self.cars
            .lock()
            .get(&plate)
            .cloned()
            .ok_or(RegistryError::NotFound)
    }

    /// Number of registered cars
    pub fn len(&self) -> usize {
        self.cars.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.lock().is_empty()
    }

    /// Copy of the whole map, for persistence
    pub fn snapshot(&self) -> BTreeMap<String, CarRecord> {
        self.cars.lock().clone()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Record a new odometer reading
    ///
    /// The reading must be non-negative and strictly greater than the
    /// current one; otherwise the record is left untouched.
    pub fn update_mileage(&self, plate: &str, mileage: i64) -> Result<()> {
        if mileage < 0 {
            return Err(RegistryError::NegativeValue);
        }
        let mileage = mileage as u64;
        let plate = normalize_plate(plate);

        let mut cars = self.cars.lock();
        let car = cars.get_mut(&plate).ok_or(RegistryError::NotFound)?;
        if mileage <= car.mileage() {
            return Err(RegistryError::OdometerRollback);
        }
        car.set_mileage(mileage);
        drop(cars);

        tracing::debug!("Mileage of {} set to {}", plate, mileage);
        Ok(())
    }

    /// Transfer a car to a new owner
    pub fn update_owner(&self, plate: &str, owner: &str) -> Result<()> {
        if owner.is_empty() {
            return Err(RegistryError::EmptyOwner);
        }
        let plate = normalize_plate(plate);

        let mut cars = self.cars.lock();
        let car = cars.get_mut(&plate).ok_or(RegistryError::NotFound)?;
        car.set_owner(owner.to_string());
        drop(cars);

        tracing::debug!("Owner of {} changed", plate);
        Ok(())
    }

    /// Register a new car
    ///
    /// Validation order: plate, seats, mileage, owner, then uniqueness.
    /// A duplicate plate never alters the existing record.
    pub fn register(&self, plate: &str, seats: i64, mileage: i64, owner: &str) -> Result<()> {
        if plate.is_empty() {
            return Err(RegistryError::EmptyLicence);
        }
        let seats = u8::try_from(seats)
            .ok()
            .filter(|s| VALID_SEATS.contains(s))
            .ok_or(RegistryError::InvalidSeats(seats))?;
        if mileage < 0 {
            return Err(RegistryError::NegativeValue);
        }
        if owner.is_empty() {
            return Err(RegistryError::EmptyOwner);
        }
        let plate = normalize_plate(plate);

        match self.cars.lock().entry(plate.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::DuplicateLicence),
            Entry::Vacant(slot) => {
                slot.insert(CarRecord::new(seats, mileage as u64, owner.to_string()));
            }
        }

        tracing::debug!("Registered {} ({} seats)", plate, seats);
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

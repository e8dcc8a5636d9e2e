//! Car record
//!
//! The value stored under a plate. The plate itself is the map key and is
//! not repeated here.

use serde::{Deserialize, Serialize};

/// Seats, mileage and owner of one registered car
///
/// `seats` is fixed at creation. `mileage` and `owner` change only through
/// [`Registry`](super::Registry) methods, which enforce the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarRecord {
    seats: u8,
    mileage: u64,
    owner: String,
}

impl CarRecord {
    pub(crate) fn new(seats: u8, mileage: u64, owner: String) -> Self {
        Self {
            seats,
            mileage,
            owner,
        }
    }

    pub fn seats(&self) -> u8 {
        self.seats
    }

    pub fn mileage(&self) -> u64 {
        self.mileage
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn set_mileage(&mut self, mileage: u64) {
        self.mileage = mileage;
    }

    pub(crate) fn set_owner(&mut self, owner: String) {
        self.owner = owner;
    }
}

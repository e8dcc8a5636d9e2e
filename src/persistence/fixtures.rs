//! Fixture data
//!
//! Synthesized when no registry file exists yet.

use std::collections::BTreeMap;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::registry::CarRecord;

/// Plates registered in a fresh registry
pub const FIXTURE_PLATES: [&str; 44] = [
    "1H1890C", "FHV449", "ABK3035", "215 MZN", "6DQX521", "174-WWA", "999991", "DA 4020",
    "303 LNM", "BEQ 0549", "1A US923", "A37 4791", "393 TUT", "458 ARW", "024 HYR", "SKM 648",
    "1253 QA", "4EB S80", "BYC 6654", "SRK-423", "3DB 09J", "3C-5772F", "PYJ 996", "768-VHN",
    "262 2636", "WYZ-94L", "326-PKF", "EJB-3105", "XXN-5911", "HVP 283", "EKW 6345", "069 DSM",
    "GZB-6052", "HGD-498", "833-132", "1XG 831", "831-THB", "HMR-299", "A04 4HE", "ERG 827",
    "XVT-2416", "306-XXL", "530-NBE", "2-4JHJ",
];

/// Owners drawn at random for fixture cars
pub const FIXTURE_OWNERS: [&str; 12] = [
    "Warisha Chandler",
    "Elysha Drennan",
    "Liona Stead",
    "Kassandra Doole",
    "Simone Reneau",
    "Halima Dent",
    "Liona Sheckles",
    "Zack Dent",
    "Josiah Reddihough",
    "Sam Dodwell",
    "Braedon Conner",
    "Eleni Abson",
];

const FIXTURE_SEATS: [u8; 5] = [2, 4, 5, 6, 7];

const FIXTURE_MAX_MILEAGE: u64 = 100_000;

/// One record per fixture plate with random seats, mileage and owner
pub fn fixture_records<R: Rng>(rng: &mut R) -> BTreeMap<String, CarRecord> {
    FIXTURE_PLATES
        .iter()
        .map(|plate| {
            let seats = FIXTURE_SEATS.choose(&mut *rng).copied().unwrap_or(4);
            let mileage = rng.random_range(0..=FIXTURE_MAX_MILEAGE);
            let owner = FIXTURE_OWNERS.choose(&mut *rng).copied().unwrap_or(FIXTURE_OWNERS[0]);
            (plate.to_string(), CarRecord::new(seats, mileage, owner.to_string()))
        })
        .collect()
}

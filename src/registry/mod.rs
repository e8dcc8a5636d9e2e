//! Registry Module
//!
//! The shared, in-memory map from licence plate to car record.
//!
//! ## Responsibilities
//! - Enforce plate uniqueness, fixed seats and a strictly rising odometer
//! - Normalize plates to upper case on every entry point
//! - Serve sorted listings and prefix searches
//! - Hand out copies only, never references across the lock
//!
//! ## Data Structure Choice
//! One BTreeMap behind one Mutex:
//! - Sorted keys for listings and binary-searched prefix lookups
//! - Every operation is linearizable with every other one
//! - This serializes all registry access. Per-key locking would raise
//!   throughput but give up the single total order.

mod record;
mod store;

pub use record::CarRecord;
pub use store::{normalize_plate, Registry, VALID_SEATS};

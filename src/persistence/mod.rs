//! Persistence Module
//!
//! Loads the registry at startup and saves it at shutdown.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ gzip stream                              │
//! │ ┌──────────────────────────────────────┐ │
//! │ │ bincode Snapshot                     │ │
//! │ │ ┌────────────────┬─────────────────┐ │ │
//! │ │ │ format_version │ plate → record  │ │ │
//! │ │ └────────────────┴─────────────────┘ │ │
//! │ └──────────────────────────────────────┘ │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Any failure to read or write the file is a `Persistence` error; the server
//! treats it as fatal rather than run with a registry it cannot trust.

mod fixtures;

pub use fixtures::{fixture_records, FIXTURE_OWNERS, FIXTURE_PLATES};

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::process;

use bincode::Options;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::registry::{CarRecord, Registry};

/// Current snapshot layout
pub const FORMAT_VERSION: u32 = 1;

/// Hard cap on the decoded snapshot size (1 GB)
const MAX_SNAPSHOT_SIZE: u64 = 1 << 30;

/// Deflate cannot expand data by more than about 1032:1
const MAX_INFLATE_RATIO: u64 = 1032;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format_version: u32,
    cars: BTreeMap<String, CarRecord>,
}

fn persistence_error(action: &str, path: &Path, e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Persistence(format!("cannot {} {}: {}", action, path.display(), e))
}

/// Load the registry from `path`
///
/// A missing file is not an error: a registry of fixture cars is generated
/// instead. Any other failure to open the file is.
///
/// Length prefixes in the snapshot are bounded by what the compressed file
/// could possibly inflate to, so a corrupt length fails instead of
/// allocating.
pub fn load(path: &Path) -> Result<Registry> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("{} not found, generating fixture data", path.display());
            return Ok(Registry::from_records(fixture_records(&mut rand::rng())));
        }
        Err(e) => return Err(persistence_error("open", path, e)),
    };

    let compressed = file
        .metadata()
        .map_err(|e| persistence_error("stat", path, e))?
        .len();
    let limit = compressed
        .saturating_mul(MAX_INFLATE_RATIO)
        .min(MAX_SNAPSHOT_SIZE);
    let decoder = GzDecoder::new(BufReader::new(file));

    let snapshot: Snapshot = bincode::DefaultOptions::new()
        .with_limit(limit)
        .deserialize_from(decoder)
        .map_err(|e| persistence_error("decode", path, e))?;

    if snapshot.format_version > FORMAT_VERSION {
        return Err(persistence_error(
            "load",
            path,
            format!("unsupported format version {}", snapshot.format_version),
        ));
    }

    tracing::debug!("Read {} records from {}", snapshot.cars.len(), path.display());
    Ok(Registry::from_records(snapshot.cars))
}

/// Save the registry to `path`, returning the number of records written
///
/// Writes a sibling temp file, syncs it, then renames it over `path`, so a
/// crash mid-save leaves the previous file intact.
pub fn save(path: &Path, registry: &Registry) -> Result<usize> {
    let snapshot = Snapshot {
        format_version: FORMAT_VERSION,
        cars: registry.snapshot(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| persistence_error("create", parent, e))?;
    }

    let temp_path = temp_path_for(path)?;
    if let Err(e) = write_snapshot(&temp_path, &snapshot) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        persistence_error("replace", path, e)
    })?;

    tracing::debug!("Wrote {} records to {}", snapshot.cars.len(), path.display());
    Ok(snapshot.cars.len())
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let file = File::create(path).map_err(|e| persistence_error("create", path, e))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

    bincode::DefaultOptions::new()
        .serialize_into(&mut encoder, snapshot)
        .map_err(|e| persistence_error("encode", path, e))?;

    let file = encoder
        .finish()
        .and_then(|writer| writer.into_inner().map_err(|e| e.into_error()))
        .map_err(|e| persistence_error("write", path, e))?;
    file.sync_all().map_err(|e| persistence_error("sync", path, e))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let mut name = path
        .file_name()
        .ok_or_else(|| persistence_error("save to", path, "not a file path"))?
        .to_os_string();
    name.push(format!(".{}.tmp", process::id()));
    Ok(path.with_file_name(name))
}

//! Persistent snapshots of a compacted knowledge base.
//!
//! A snapshot is a bincode-encoded [`Snapshot`]: a format number, the time
//! it was written, the capability groups its devices were resolved with and
//! every [`DeviceEntry`] in registration order. Capability maps are never
//! written; only [`Properties`](crate::Properties) survive. Reloading keeps
//! the order, so re-indexing a snapshot makes the same first-wins decisions
//! as the load that produced it.
//!
//! Writes go to a sibling named `<file name>.tmp` first and are renamed into
//! place, so a reader never sees a half-written snapshot. The temp file is
//! removed on failure.
//!
//! A snapshot is rejected (and the caller rebuilds from source) when it
//! cannot be read or decoded, carries another format number, was resolved
//! with other capability groups than the caller asks for, holds too few
//! devices to be a real catalog, or references a parent it does not contain.

use crate::AllowedGroups;
use crate::error::CacheError;
use crate::knowledge::{DeviceEntry, KnowledgeBase};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current snapshot format. Bump whenever [`Snapshot`] or [`DeviceEntry`]
/// changes shape.
pub const FORMAT: u32 = 2;

/// Snapshots with at most this many devices are treated as truncated.
pub const DEFAULT_MIN_DEVICES: usize = 10;

/// On-disk layout.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: u32,
    /// Unix timestamp (seconds, UTC) of the write.
    pub created_at: i64,
    /// Sorted capability group names.
    pub groups: Vec<String>,
    pub devices: Vec<DeviceEntry>,
}

/// Write `kb` to `path`, replacing any previous snapshot.
pub fn save(path: &Path, kb: &KnowledgeBase) -> Result<(), CacheError> {
    let snapshot = Snapshot {
        format: FORMAT,
        created_at: Utc::now().timestamp(),
        groups: kb.groups().to_vec(),
        devices: kb.entries().to_vec(),
    };

    let temp_path = temp_path(path);
    if let Err(err) = write_snapshot(&temp_path, &snapshot) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    info!(path = %path.display(), devices = snapshot.devices.len(), "wrote device cache");
    Ok(())
}

/// `path` with `.tmp` appended to its file name. Never collides with a
/// sibling that merely shares the stem.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), CacheError> {
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, snapshot).map_err(CacheError::Encode)?;
    writer.flush()?;
    Ok(())
}

/// Read and validate the snapshot at `path`.
///
/// The snapshot must have been resolved with exactly `groups`. `min_devices`
/// is exclusive: a snapshot must hold more than that many devices to be
/// accepted.
pub fn try_load(path: &Path, groups: &AllowedGroups, min_devices: usize) -> Result<KnowledgeBase, CacheError> {
    let reader = BufReader::new(File::open(path)?);
    let snapshot: Snapshot = bincode::deserialize_from(reader).map_err(CacheError::Decode)?;

    if snapshot.format != FORMAT {
        return Err(CacheError::Version { found: snapshot.format, expected: FORMAT });
    }
    let expected = groups.names();
    if snapshot.groups != expected {
        return Err(CacheError::Groups { found: snapshot.groups, expected });
    }
    if snapshot.devices.len() <= min_devices {
        return Err(CacheError::TooSmall { found: snapshot.devices.len(), min: min_devices });
    }

    if let Some(written) = Utc.timestamp_opt(snapshot.created_at, 0).single() {
        let age = Utc::now().signed_duration_since(written);
        debug!(path = %path.display(), written = %written.to_rfc3339(), age_hours = age.num_hours(), "device cache age");
    }

    Ok(KnowledgeBase::from_entries(snapshot.groups, snapshot.devices)?)
}

/// [`try_load`], logging and discarding the reason a snapshot was rejected.
pub fn load(path: &Path, groups: &AllowedGroups, min_devices: usize) -> Option<KnowledgeBase> {
    match try_load(path, groups, min_devices) {
        Ok(kb) => {
            info!(path = %path.display(), devices = kb.len(), "loaded device cache");
            Some(kb)
        }
        Err(CacheError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no device cache");
            None
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring device cache");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeviceRecord, resolver};

    fn groups() -> AllowedGroups {
        AllowedGroups::from_csv("product_info,display")
    }

    fn catalog(n: usize) -> KnowledgeBase {
        let mut records = vec![
            DeviceRecord::new("generic", "root", "")
                .with_capability("product_info", "brand_name", "")
                .with_capability("display", "resolution_width", "90"),
        ];
        for i in 0..n.saturating_sub(1) {
            records.push(
                DeviceRecord::new(format!("phone_{i}"), "generic", format!("Phone{i}/1.0"))
                    .with_capability("product_info", "brand_name", "Acme")
                    .with_capability("product_info", "model_name", format!("Model {i}")),
            );
        }
        let mut kb = resolver::resolve(records, &groups()).unwrap();
        kb.compact();
        kb
    }

    fn write_raw(path: &Path, snapshot: &Snapshot) {
        fs::write(path, bincode::serialize(snapshot).unwrap()).unwrap();
    }

    #[test]
    fn snapshot_round_trip_keeps_order_and_properties() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.bin");
        let kb = catalog(12);

        save(&path, &kb).unwrap();
        let loaded = try_load(&path, &groups(), DEFAULT_MIN_DEVICES).unwrap();

        assert_eq!(loaded.len(), 12);
        assert!(loaded.is_compacted());
        assert_eq!(loaded.groups(), kb.groups());
        let ids = |kb: &KnowledgeBase| kb.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&loaded), ids(&kb));

        let phone = loaded.find("phone_3").unwrap();
        assert_eq!(phone.properties.model_name, "Model 3");
        assert_eq!(phone.properties.resolution_width, "90");
        assert!(phone.capabilities().is_none());
        assert!(loaded.children("generic").unwrap().contains("phone_3"));
        assert!(!dir.path().join("devices.bin.tmp").exists());
    }

    #[test]
    fn temp_file_does_not_clobber_a_sibling_sharing_the_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.bin");
        let sibling = dir.path().join("devices.tmp");
        fs::write(&sibling, b"unrelated").unwrap();

        save(&path, &catalog(12)).unwrap();

        assert_eq!(fs::read(&sibling).unwrap(), b"unrelated");
        assert!(!dir.path().join("devices.bin.tmp").exists());
        assert!(try_load(&path, &groups(), DEFAULT_MIN_DEVICES).is_ok());
    }

    #[test]
    fn snapshot_path_may_itself_end_in_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.tmp");

        save(&path, &catalog(12)).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("devices.tmp.tmp").exists());
        assert_eq!(try_load(&path, &groups(), DEFAULT_MIN_DEVICES).unwrap().len(), 12);
    }

    #[test]
    fn small_snapshots_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.bin");
        save(&path, &catalog(3)).unwrap();

        assert!(matches!(
            try_load(&path, &groups(), DEFAULT_MIN_DEVICES),
            Err(CacheError::TooSmall { found: 3, min: 10 })
        ));
        assert!(load(&path, &groups(), DEFAULT_MIN_DEVICES).is_none());
        assert!(try_load(&path, &groups(), 2).is_ok());
    }

    #[test]
    fn exactly_the_minimum_is_still_too_small() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.bin");
        save(&path, &catalog(10)).unwrap();
        assert!(matches!(try_load(&path, &groups(), 10), Err(CacheError::TooSmall { found: 10, .. })));
    }

    #[test]
    fn other_groups_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.bin");
        save(&path, &catalog(12)).unwrap();

        let wider = AllowedGroups::from_csv("product_info,display,markup");
        match try_load(&path, &wider, DEFAULT_MIN_DEVICES) {
            Err(CacheError::Groups { found, expected }) => {
                assert_eq!(found, groups().names());
                assert_eq!(expected, wider.names());
            }
            other => panic!("expected a group mismatch, got {:?}", other.map(|kb| kb.len())),
        }
        assert!(load(&path, &AllowedGroups::from_csv("product_info"), DEFAULT_MIN_DEVICES).is_none());
        // Listing order does not matter.
        assert!(try_load(&path, &AllowedGroups::from_csv("display, product_info"), DEFAULT_MIN_DEVICES).is_ok());
    }

    #[test]
    fn corrupt_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.bin");
        fs::write(&path, b"definitely not bincode").unwrap();

        assert!(try_load(&path, &groups(), 0).is_err());
        assert!(load(&path, &groups(), 0).is_none());
    }

    #[test]
    fn other_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.bin");
        let snapshot = Snapshot {
            format: FORMAT + 1,
            created_at: 0,
            groups: groups().names(),
            devices: catalog(12).entries().to_vec(),
        };
        write_raw(&path, &snapshot);

        assert!(matches!(
            try_load(&path, &groups(), DEFAULT_MIN_DEVICES),
            Err(CacheError::Version { found: 3, expected: 2 })
        ));
    }

    #[test]
    fn missing_parent_in_snapshot_is_inconsistent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.bin");
        let devices: Vec<DeviceEntry> = catalog(12).iter().filter(|e| e.id != "generic").cloned().collect();
        let snapshot = Snapshot { format: FORMAT, created_at: Utc::now().timestamp(), groups: groups().names(), devices };
        write_raw(&path, &snapshot);

        assert!(matches!(try_load(&path, &groups(), DEFAULT_MIN_DEVICES), Err(CacheError::Inconsistent(_))));
    }

    #[test]
    fn missing_file_is_not_a_cache() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.bin"), &groups(), 0).is_none());
    }
}

//! JSON file shared between the capture worker and readers

use lldpscope_core::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::neighbor::Neighbor;

/// The persisted neighbor table.
///
/// Only the capture worker writes; everyone else reads. Writes go to a
/// temporary file in the same directory that is then renamed over the
/// store, so readers see either the old or the new table, never a torn one.
#[derive(Debug, Clone)]
pub struct NeighborStore {
    path: PathBuf,
}

impl NeighborStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Name prefix of in-flight temporary files, e.g. `.neighbors.json.`
    fn temp_prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "neighbors".to_string());
        format!(".{}.", name)
    }

    /// Read the table.
    ///
    /// A missing or empty file is an empty table. A file that is not a JSON
    /// object is [`Error::Store`]. Individual entries that do not parse are
    /// skipped.
    pub fn load(&self) -> Result<BTreeMap<String, Neighbor>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let raw: BTreeMap<String, Value> = serde_json::from_str(&text).map_err(|e| {
            Error::Store(format!("{} is not a neighbor table: {}", self.path.display(), e))
        })?;

        let mut neighbors = BTreeMap::new();
        for (key, value) in raw {
            match serde_json::from_value::<Neighbor>(value) {
                Ok(neighbor) => {
                    neighbors.insert(key, neighbor);
                }
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable neighbor entry"),
            }
        }

        debug!(path = %self.path.display(), count = neighbors.len(), "Neighbor store loaded");
        Ok(neighbors)
    }

    /// Replace the store with `neighbors` atomically
    pub fn save(&self, neighbors: &BTreeMap<String, Neighbor>) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(&dir)?;

        let mut tmp = Builder::new().prefix(&self.temp_prefix()).tempfile_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, neighbors)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %self.path.display(), count = neighbors.len(), "Neighbor store saved");
        Ok(())
    }

    /// Delete temporary files a crashed writer left next to the store.
    ///
    /// Only safe while no other writer is saving.
    pub fn sweep_temp_files(&self) -> Result<usize> {
        let entries = match fs::read_dir(self.dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let prefix = self.temp_prefix();
        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let leftover = name.len() > prefix.len() && name.starts_with(&prefix);
            if !leftover || !entry.file_type()?.is_file() {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if removed > 0 {
            info!(path = %self.path.display(), removed, "Removed leftover temporary store files");
        }
        Ok(removed)
    }

    /// Delete the store file; a missing file is fine
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lldpscope_protocol::DecodedFields;
    use tempfile::tempdir;

    fn sample() -> BTreeMap<String, Neighbor> {
        let fields = DecodedFields {
            chassis_id: "sw1".to_string(),
            ..Default::default()
        };
        let n = Neighbor::new("eth0", "aa:bb:cc:dd:ee:ff", fields, Utc::now());
        let mut map = BTreeMap::new();
        map.insert(n.identity_key(), n);
        map
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = NeighborStore::new(dir.path().join("neighbors.json"));
        assert!(store.load().unwrap().is_empty());
        store.remove().unwrap();
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = NeighborStore::new(dir.path().join("neighbors.json"));
        let table = sample();

        store.save(&table).unwrap();
        assert_eq!(store.load().unwrap(), table);

        // No temp files left behind
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_truncated_file_is_store_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("neighbors.json");
        fs::write(&path, "{\"eth0:aa:bb:cc:dd:ee:ff:sw1\": {\"interface\": \"et").unwrap();

        let store = NeighborStore::new(&path);
        assert!(matches!(store.load(), Err(Error::Store(_))));
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("neighbors.json");
        fs::write(&path, "").unwrap();
        assert!(NeighborStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_bad_entry_skipped() {
        let dir = tempdir().unwrap();
        let store = NeighborStore::new(dir.path().join("neighbors.json"));
        store.save(&sample()).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        let mut raw: BTreeMap<String, Value> = serde_json::from_str(&text).unwrap();
        raw.insert("bogus".to_string(), serde_json::json!({"interface": 5}));
        fs::write(store.path(), serde_json::to_string(&raw).unwrap()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded.contains_key("bogus"));
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let store = NeighborStore::new(dir.path().join("neighbors.json"));
        store.save(&sample()).unwrap();
        store.remove().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempdir().unwrap();
        let store = NeighborStore::new(dir.path().join("nested/dir/neighbors.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_sweep_removes_only_leftovers() {
        let dir = tempdir().unwrap();
        let store = NeighborStore::new(dir.path().join("neighbors.json"));
        store.save(&sample()).unwrap();

        fs::write(dir.path().join(".neighbors.json.x7Kq2a"), "{\"half\": ").unwrap();
        fs::write(dir.path().join(".neighbors.json.Pz81mB"), "").unwrap();
        fs::write(dir.path().join("lldpscope.pid"), "42").unwrap();
        fs::write(dir.path().join(".tmpAbCdEf"), "").unwrap();

        assert_eq!(store.sweep_temp_files().unwrap(), 2);
        assert!(!dir.path().join(".neighbors.json.x7Kq2a").exists());
        assert!(dir.path().join("lldpscope.pid").exists());
        assert!(dir.path().join(".tmpAbCdEf").exists());
        assert_eq!(store.load().unwrap().len(), 1);

        assert_eq!(store.sweep_temp_files().unwrap(), 0);
    }

    #[test]
    fn test_sweep_missing_directory() {
        let dir = tempdir().unwrap();
        let store = NeighborStore::new(dir.path().join("absent/neighbors.json"));
        assert_eq!(store.sweep_temp_files().unwrap(), 0);
    }
}

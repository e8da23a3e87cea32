//! Neighbor table shared between the capture path, eviction and queries

use chrono::Utc;
use lldpscope_core::{Error, Result};
use lldpscope_protocol::DecodedFields;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::neighbor::{Neighbor, NeighborView};
use crate::session::Session;
use crate::store::NeighborStore;
use crate::table::{NeighborTable, Upsert};

/// Whether this process may write the shared store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    /// The capture worker; persists every change
    Writer,
    /// Any other process; only reloads
    Reader,
}

/// Lock-protected [`NeighborTable`] backed by a [`NeighborStore`].
///
/// The table lock covers table access only. Every snapshot taken under it
/// carries a generation number; writes to the store are serialized by a
/// separate lock and a snapshot older than the last one written is dropped.
#[derive(Clone)]
pub struct NeighborRegistry {
    table: Arc<Mutex<NeighborTable>>,
    generation: Arc<AtomicU64>,
    /// Generation of the snapshot currently on disk
    written: Arc<Mutex<u64>>,
    store: NeighborStore,
    role: StoreRole,
}

impl NeighborRegistry {
    pub fn new(store: NeighborStore, role: StoreRole) -> Self {
        Self {
            table: Arc::new(Mutex::new(NeighborTable::new())),
            generation: Arc::new(AtomicU64::new(0)),
            written: Arc::new(Mutex::new(0)),
            store,
            role,
        }
    }

    pub fn writer(store: NeighborStore) -> Self {
        Self::new(store, StoreRole::Writer)
    }

    pub fn reader(store: NeighborStore) -> Self {
        Self::new(store, StoreRole::Reader)
    }

    /// Read-only view of the session's store
    pub fn open_reader(session: &Session) -> Self {
        Self::reader(NeighborStore::new(session.paths().neighbors_file()))
    }

    pub fn store(&self) -> &NeighborStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Stamp a snapshot; must be called with the table lock held
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn persist(&self, generation: u64, table: &BTreeMap<String, Neighbor>) -> Result<()> {
        if self.role != StoreRole::Writer {
            return Ok(());
        }

        let mut written = self.written.lock();
        if generation <= *written {
            debug!(generation, written = *written, "Skipping superseded snapshot");
            return Ok(());
        }
        self.store.save(table)?;
        *written = generation;
        Ok(())
    }

    /// Merge one decoded announcement and persist the table
    pub fn record(&self, interface: &str, source_mac: &str, fields: DecodedFields) -> Result<Upsert> {
        let chassis_id = fields.chassis_id.clone();
        let (outcome, generation, snapshot) = {
            let mut table = self.table.lock();
            let outcome = table.upsert(interface, source_mac, fields, Utc::now());
            (outcome, self.next_generation(), table.snapshot())
        };

        match outcome {
            Upsert::Inserted => info!(
                interface,
                source_mac,
                chassis_id = %chassis_id,
                "New neighbor"
            ),
            Upsert::Updated => debug!(
                interface,
                source_mac,
                chassis_id = %chassis_id,
                "Neighbor refreshed"
            ),
        }

        self.persist(generation, &snapshot)?;
        Ok(outcome)
    }

    /// Evict expired neighbors; persists only when something was removed
    pub fn evict_and_persist(&self) -> Result<usize> {
        let (removed, snapshot) = {
            let mut table = self.table.lock();
            let removed = table.evict_expired(Utc::now());
            let snapshot = (!removed.is_empty()).then(|| (self.next_generation(), table.snapshot()));
            (removed, snapshot)
        };

        for key in &removed {
            info!(key = %key, "Neighbor expired");
        }
        if let Some((generation, snapshot)) = snapshot {
            self.persist(generation, &snapshot)?;
        }
        Ok(removed.len())
    }

    /// Replace the in-memory table with the store's content.
    ///
    /// An unparseable store is logged and counts as empty.
    pub fn reload(&self) -> Result<()> {
        let neighbors = match self.store.load() {
            Ok(neighbors) => neighbors,
            Err(Error::Store(msg)) => {
                warn!(error = %msg, "Neighbor store unreadable, treating as empty");
                Default::default()
            }
            Err(e) => return Err(e),
        };

        self.table.lock().replace(neighbors);
        Ok(())
    }

    /// Current neighbors: reload, drop anything past its TTL, then view
    pub fn get_neighbors(&self) -> Result<Vec<NeighborView>> {
        self.reload()?;

        let now = Utc::now();
        let mut table = self.table.lock();
        table.evict_expired(now);
        Ok(table.views(now))
    }

    /// Forget every neighbor and delete the store file
    pub fn clear_neighbors(&self) -> Result<()> {
        let mut written = self.written.lock();
        let generation = {
            let mut table = self.table.lock();
            table.clear();
            self.next_generation()
        };
        self.store.remove()?;
        *written = generation;
        drop(written);

        info!(path = %self.store.path().display(), "Neighbors cleared");
        Ok(())
    }
}

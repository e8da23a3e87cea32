//! In-memory neighbor table

use chrono::{DateTime, Utc};
use lldpscope_protocol::DecodedFields;
use std::collections::BTreeMap;

use crate::neighbor::{identity_key, Neighbor, NeighborView};

/// Outcome of [`NeighborTable::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Neighbors by identity key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborTable {
    neighbors: BTreeMap<String, Neighbor>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an announcement from `source_mac` on `interface`
    pub fn upsert(
        &mut self,
        interface: &str,
        source_mac: &str,
        fields: DecodedFields,
        now: DateTime<Utc>,
    ) -> Upsert {
        let key = identity_key(interface, source_mac, &fields.chassis_id);
        match self.neighbors.get_mut(&key) {
            Some(existing) => {
                existing.update(fields, now);
                Upsert::Updated
            }
            None => {
                self.neighbors
                    .insert(key, Neighbor::new(interface, source_mac, fields, now));
                Upsert::Inserted
            }
        }
    }

    /// Drop every neighbor whose TTL has elapsed at `now`; returns their keys
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = self
            .neighbors
            .iter()
            .filter(|(_, n)| n.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.neighbors.remove(key);
        }
        expired
    }

    /// Query views ordered by interface, then key
    pub fn views(&self, now: DateTime<Utc>) -> Vec<NeighborView> {
        let mut entries: Vec<(&String, &Neighbor)> = self.neighbors.iter().collect();
        entries.sort_by(|a, b| a.1.interface.cmp(&b.1.interface).then(a.0.cmp(b.0)));
        entries.into_iter().map(|(_, n)| n.view(now)).collect()
    }

    pub fn get(&self, key: &str) -> Option<&Neighbor> {
        self.neighbors.get(key)
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn clear(&mut self) {
        self.neighbors.clear();
    }

    /// Copy of the map for persisting outside the lock
    pub fn snapshot(&self) -> BTreeMap<String, Neighbor> {
        self.neighbors.clone()
    }

    /// Replace the whole content, e.g. after a reload
    pub fn replace(&mut self, neighbors: BTreeMap<String, Neighbor>) {
        self.neighbors = neighbors;
    }
}

//! Discovered neighbor records

use chrono::{DateTime, Duration, Utc};
use lldpscope_protocol::DecodedFields;
use serde::{Deserialize, Serialize};

/// Key under which a neighbor is stored: `interface:source_mac:chassis_id`
pub fn identity_key(interface: &str, source_mac: &str, chassis_id: &str) -> String {
    format!("{}:{}:{}", interface, source_mac, chassis_id)
}

/// One neighbor as persisted in the shared store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Local interface the announcement arrived on
    pub interface: String,
    /// Ethernet source address of the announcement
    pub source_mac: String,
    /// Decoded LLDPDU
    pub data: DecodedFields,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Seconds after `last_seen` at which the neighbor expires
    pub ttl: u64,
}

impl Neighbor {
    pub fn new(
        interface: impl Into<String>,
        source_mac: impl Into<String>,
        data: DecodedFields,
        now: DateTime<Utc>,
    ) -> Self {
        let ttl = data.ttl as u64;
        Self {
            interface: interface.into(),
            source_mac: source_mac.into(),
            data,
            first_seen: now,
            last_seen: now,
            ttl,
        }
    }

    /// Refresh from a new announcement; `first_seen` is kept
    pub fn update(&mut self, data: DecodedFields, now: DateTime<Utc>) {
        self.ttl = data.ttl as u64;
        self.data = data;
        self.last_seen = now;
    }

    pub fn identity_key(&self) -> String {
        identity_key(&self.interface, &self.source_mac, &self.data.chassis_id)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.last_seen + Duration::seconds(self.ttl as i64)
    }

    /// Expired strictly after `last_seen + ttl`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    /// Whole seconds left before expiry, zero once expired
    pub fn expires_in(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at() - now).num_seconds().max(0) as u64
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.first_seen
    }

    pub fn view(&self, now: DateTime<Utc>) -> NeighborView {
        NeighborView {
            interface: self.interface.clone(),
            source_mac: self.source_mac.clone(),
            age: format_age(self.age(now)),
            expires_in: self.expires_in(now),
            last_seen: self.last_seen,
            fields: self.data.clone(),
        }
    }
}

/// Neighbor as returned to queries.
///
/// The advertised TTL comes through the flattened `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborView {
    pub interface: String,
    pub source_mac: String,
    /// Time since first seen, e.g. `3m 12s`
    pub age: String,
    pub expires_in: u64,
    pub last_seen: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: DecodedFields,
}

/// Compact age: `Nd Hh`, `Hh Mm` or `Mm Ss`
pub fn format_age(age: Duration) -> String {
    let total = age.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}

//! Direction and bridge classification for normalized records
//!
//! Tags each record with its direction relative to the subject address and
//! whether the counterparty is a recognized bridge/router contract. The
//! recognition list is injected ([`KnownContracts`]); an empty list is valid
//! and simply yields zero bridged totals.
//!
//! Contract labeling goes through an explicit [`LabelCache`] collaborator
//! instead of ambient process-wide state, so tests can substitute an empty
//! cache.

use super::normalizer::TransferRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A TransferRecord plus its classification relative to the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub record: TransferRecord,
    pub direction: Direction,
    pub counterparty_is_bridge: bool,
}

/// Allow-list of recognized contracts: bridge/router status plus a display
/// label. All addresses are stored lowercased.
#[derive(Debug, Clone, Default)]
pub struct KnownContracts {
    bridges: HashSet<String>,
    labels: HashMap<String, String>,
}

impl KnownContracts {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &str, label: &str, is_bridge: bool) {
        let addr = address.to_lowercase();
        if is_bridge {
            self.bridges.insert(addr.clone());
        }
        self.labels.insert(addr, label.to_string());
    }

    pub fn is_bridge(&self, address: &str) -> bool {
        self.bridges.contains(&address.to_lowercase())
    }

    pub fn label(&self, address: &str) -> Option<&str> {
        self.labels.get(&address.to_lowercase()).map(|s| s.as_str())
    }

    /// Default registry for Base mainnet: the router/bridge address book
    /// shipped with the checker. Stargate routers are the bridge entries.
    pub fn base_defaults() -> Self {
        let mut c = Self::empty();
        // Uniswap
        c.insert("0x68b3465833fb72a70ecdf485e0e4c7bd8665fc45", "Uniswap", false);
        c.insert("0x2626664c2603336e57b271c5c0b26f421741e481", "Uniswap", false);
        c.insert("0x6ff5693b99212da76ad316178a184ab56d299b43", "Uniswap", false);
        c.insert("0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad", "Uniswap", false);
        // Aerodrome
        c.insert("0xcf77a3ba9a5ca399b7c97c74d54e5b1beb874e43", "Aerodrome", false);
        // Stargate (bridge)
        c.insert("0x45f1a95a4d3f3836523f5c83673c797f4d4d263b", "Stargate", true);
        c.insert("0x50b6ebc2103bfec165949cc946d739d5650d7ae4", "Stargate", true);
        c.insert("0x45a01e4e04f14f7a4a6702c74187c5f6222033cd", "Stargate", true);
        // Zerion
        c.insert("0xd7f1dd5d49206349cae8b585fcb0ce3d96f1696f", "Zerion", false);
        c
    }
}

/// Read-through cache for contract labels resolved from external services.
pub trait LabelCache {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: &str);
}

/// In-memory LabelCache. Keys are lowercased on the way in.
#[derive(Debug, Default)]
pub struct MemoryLabelCache {
    entries: HashMap<String, String>,
}

impl MemoryLabelCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LabelCache for MemoryLabelCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(&key.to_lowercase()).cloned()
    }

    fn put(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_lowercase(), value.to_string());
    }
}

/// Classifies records relative to one lowercase subject address.
pub struct Classifier<'a> {
    subject: String,
    contracts: &'a KnownContracts,
}

impl<'a> Classifier<'a> {
    pub fn new(subject: &str, contracts: &'a KnownContracts) -> Self {
        Self {
            subject: subject.to_lowercase(),
            contracts,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Direction rule: Inbound iff `to` equals the subject. A self-transfer
    /// (from == to == subject) is therefore Inbound; that matches the
    /// documented rule, not an oversight. Contract creation (`to` absent)
    /// is Outbound.
    pub fn classify(&self, record: TransferRecord) -> ClassifiedRecord {
        let direction = match record.to.as_deref() {
            Some(to) if to == self.subject => Direction::Inbound,
            _ => Direction::Outbound,
        };

        let counterparty = match direction {
            Direction::Inbound => Some(record.from.as_str()),
            Direction::Outbound => record.to.as_deref(),
        };
        let counterparty_is_bridge = counterparty
            .map(|addr| self.contracts.is_bridge(addr))
            .unwrap_or(false);

        ClassifiedRecord {
            record,
            direction,
            counterparty_is_bridge,
        }
    }

    /// Resolve a display label for a counterparty: the static registry wins,
    /// then the injected cache.
    pub fn label_for(&self, address: &str, cache: &dyn LabelCache) -> Option<String> {
        if let Some(label) = self.contracts.label(address) {
            return Some(label.to_string());
        }
        cache.get(address)
    }
}

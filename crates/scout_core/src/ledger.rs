use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ComponentState, ItemId};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("stored ledger is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to encode ledger: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Accumulated observations for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub count: u32,
    pub component_states: Vec<ComponentState>,
    /// Epoch milliseconds of the first interception; never rewritten.
    pub first_discovered: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Rediscovered { count: u32 },
}

/// Item id -> record, persisted per catalog page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscoveryLedger {
    records: BTreeMap<ItemId, Record>,
}

impl DiscoveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(
        &mut self,
        id: ItemId,
        component_states: Vec<ComponentState>,
        now_ms: u64,
    ) -> Upsert {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.count = record.count.saturating_add(1);
                record.component_states = component_states;
                Upsert::Rediscovered {
                    count: record.count,
                }
            }
            None => {
                self.records.insert(
                    id,
                    Record {
                        count: 1,
                        component_states,
                        first_discovered: now_ms,
                    },
                );
                Upsert::Created
            }
        }
    }

    pub fn get(&self, id: &ItemId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.records.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &Record)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string(self).map_err(LedgerError::Encode)
    }

    pub fn from_json(raw: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(raw).map_err(LedgerError::Corrupt)
    }

    /// Restore from an optional stored blob. Missing or corrupt data yields an
    /// empty ledger; corruption is logged.
    pub fn restore_or_empty(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::new();
        };
        match Self::from_json(raw) {
            Ok(ledger) => {
                engine_logging::engine_info!("Restored ledger with {} records", ledger.len());
                ledger
            }
            Err(err) => {
                engine_logging::engine_warn!("Discarding stored ledger: {}", err);
                Self::new()
            }
        }
    }
}

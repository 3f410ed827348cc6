use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

use crate::types::{Address, DocumentKey};

/// Largest retention the journal accepts; larger requests are clamped.
pub const MAX_EVENT_CAPACITY: usize = 65_536;

/// Notification emitted by a successful state-changing registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEvent {
    DocumentCreated { key: DocumentKey },
    DocumentSigned { key: DocumentKey, identity: Address },
}

impl RegistryEvent {
    pub fn label(&self) -> &'static str {
        match self {
            RegistryEvent::DocumentCreated { .. } => "CREATED",
            RegistryEvent::DocumentSigned { .. } => "SIGNED",
        }
    }

    pub fn key(&self) -> &DocumentKey {
        match self {
            RegistryEvent::DocumentCreated { key } => key,
            RegistryEvent::DocumentSigned { key, .. } => key,
        }
    }
}

/// Event plus its position in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub event: RegistryEvent,
    pub timestamp: String, // RFC3339
}

struct JournalState {
    records: VecDeque<EventRecord>,
    next_sequence: u64,
}

/// Ordered notification stream for registry observers (indexers, audit trails).
///
/// Keeps the most recent `capacity` records in memory and fans every record out to
/// live subscribers. `capacity` is clamped to `1..=MAX_EVENT_CAPACITY`.
pub struct EventJournal {
    state: Mutex<JournalState>,
    capacity: usize,
    sender: broadcast::Sender<EventRecord>,
}

impl EventJournal {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_EVENT_CAPACITY);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            state: Mutex::new(JournalState {
                records: VecDeque::with_capacity(capacity.min(1_024)),
                next_sequence: 0,
            }),
            capacity,
            sender,
        }
    }

    /// Append an event. Callers hold the registry write lock, so journal order is
    /// commit order.
    pub fn record(&self, event: RegistryEvent) -> EventRecord {
        // A poisoned journal still has consistent records; keep appending.
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let record = EventRecord {
            sequence: state.next_sequence,
            event,
            timestamp: now_rfc3339(),
        };
        state.next_sequence += 1;

        if state.records.len() == self.capacity {
            state.records.pop_front(); // evict oldest
        }
        state.records.push_back(record.clone());

        match &record.event {
            RegistryEvent::DocumentCreated { key } => {
                info!(seq = record.sequence, event = record.event.label(), key = %key, "registry event");
            }
            RegistryEvent::DocumentSigned { key, identity } => {
                info!(seq = record.sequence, event = record.event.label(), key = %key, identity = %identity, "registry event");
            }
        }

        // No subscribers is not an error.
        let _ = self.sender.send(record.clone());
        record
    }

    /// Most recent `count` records, newest first.
    pub fn recent(&self, count: usize) -> Vec<EventRecord> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.records.iter().rev().take(count).cloned().collect()
    }

    /// Every retained record, oldest first.
    pub fn all(&self) -> Vec<EventRecord> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.records.iter().cloned().collect()
    }

    /// Total events ever recorded, including evicted ones.
    pub fn total(&self) -> u64 {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).next_sequence
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }
}

/// Helper to get current timestamp as RFC3339 string
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

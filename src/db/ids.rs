//! Record identifiers
//!
//! Keyset pagination orders by the primary key, so a new record must sort
//! after every record created before it. IDs are `<PREFIX>_<uuid v7 hex>`.
//! A v7 UUID starts with a millisecond timestamp, and fixed-width lowercase
//! hex compares the same way as the underlying 128-bit value.

use parking_lot::Mutex;
use uuid::Uuid;

/// Source of new record IDs.
pub trait IdGenerator: Send + Sync {
    /// A fresh ID that sorts after every ID this generator returned before.
    fn next_id(&self, prefix: &str) -> String;
}

/// UUIDv7 generator that stays strictly increasing within the process,
/// even when several IDs land in the same millisecond or the clock steps back.
#[derive(Debug, Default)]
pub struct SortableIdGenerator {
    last: Mutex<u128>,
}

impl SortableIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_uuid(&self) -> Uuid {
        let candidate = Uuid::now_v7().as_u128();
        let mut last = self.last.lock();
        let value = if candidate > *last {
            candidate
        } else {
            last.wrapping_add(1)
        };
        *last = value;
        Uuid::from_u128(value)
    }
}

impl IdGenerator for SortableIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.next_uuid().simple())
    }
}

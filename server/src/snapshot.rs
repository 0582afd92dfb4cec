//! Best-effort snapshot persistence for warm restarts
//!
//! Rooms are periodically written behind a key-value store so a restarted
//! process can pick sessions back up. The store is a cache with a TTL, not a
//! source of truth: while the process lives, in-memory room state is
//! authoritative, and a missing or expired snapshot just means the room is
//! regenerated from scratch.

use crate::room::RoomSnapshot;
use async_trait::async_trait;
use shared::SNAPSHOT_TTL_SECS;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("snapshot backend error: {0}")]
    Backend(String),
}

/// Key-value contract the registry persists room snapshots through.
///
/// Keys are namespaced `room:<roomId>`. Values expire after the configured
/// TTL; after that `load` reports absence and the registry must be prepared
/// to regenerate the room.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, room_id: &str, value: Vec<u8>) -> Result<(), StoreError>;
    async fn load(&self, room_id: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

pub fn encode_snapshot(snapshot: &RoomSnapshot) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(snapshot)?)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<RoomSnapshot, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

fn room_key(room_id: &str) -> String {
    format!("room:{}", room_id)
}

/// In-process store with per-entry expiry. Covers single-process
/// deployments and tests; an external store (e.g. Redis) would implement
/// the same trait.
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
    ttl: Duration,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(SNAPSHOT_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, room_id: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let expires = Instant::now() + self.ttl;
        self.entries
            .lock()
            .await
            .insert(room_key(room_id), (value, expires));
        Ok(())
    }

    async fn load(&self, room_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut entries = self.entries.lock().await;
        let key = room_key(room_id);

        match entries.get(&key) {
            Some((_, expires)) if *expires <= Instant::now() => {
                entries.remove(&key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Board;

    fn test_snapshot() -> RoomSnapshot {
        RoomSnapshot {
            id: "lobby".to_string(),
            board: Board {
                width: 2,
                height: 2,
                cells: vec![vec!['A', 'B'], vec!['C', 'D']],
            },
            placements: Vec::new(),
            found_words: Vec::new(),
            players: Vec::new(),
            created_at: 1000,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let store = MemorySnapshotStore::new();
        let snapshot = test_snapshot();

        let bytes = encode_snapshot(&snapshot).unwrap();
        store.save("lobby", bytes).await.unwrap();

        let loaded = store.load("lobby").await.unwrap().unwrap();
        assert_eq!(decode_snapshot(&loaded).unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_load_missing_room() {
        let store = MemorySnapshotStore::new();
        assert!(store.load("nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = MemorySnapshotStore::with_ttl(Duration::ZERO);
        let bytes = encode_snapshot(&test_snapshot()).unwrap();
        store.save("lobby", bytes).await.unwrap();

        assert!(store.load("lobby").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rooms_are_keyed_independently() {
        let store = MemorySnapshotStore::new();
        store.save("a", vec![1]).await.unwrap();
        store.save("b", vec![2]).await.unwrap();

        assert_eq!(store.load("a").await.unwrap(), Some(vec![1]));
        assert_eq!(store.load("b").await.unwrap(), Some(vec![2]));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_snapshot(&[0xff, 0x00, 0x13]).is_err());
    }
}

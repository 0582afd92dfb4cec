//! Session registry: the table of live rooms and the concurrency rules
//! governing access to them
//!
//! Every room lives behind its own `Arc<Mutex<Room>>`; the registry itself
//! only guards the id-to-room table with a `RwLock`. Membership changes and
//! word attempts on one room serialize on that room's mutex — validate,
//! duplicate-check, record and credit run as one critical section, which is
//! what makes word credit at-most-once. Different rooms never contend.
//!
//! Snapshot persistence is write-behind and best-effort: the snapshot is
//! taken under the room lock, but encoding and the store write happen in a
//! spawned task after the lock is released, so a slow or failing store can
//! degrade recovery without ever stalling gameplay. Snapshot loads happen
//! synchronously on the first access to an unknown room id.

use crate::board;
use crate::room::{Room, RoomSnapshot};
use crate::snapshot::{decode_snapshot, encode_snapshot, SnapshotStore};
use crate::utils::{get_timestamp, player_color};
use crate::validator;
use log::{info, warn};
use rand::thread_rng;
use shared::{
    Board, FoundWord, GameStats, Player, PlayerRanking, WordAttempt, DEFAULT_BOARD_HEIGHT,
    DEFAULT_BOARD_WIDTH, DEFAULT_WORD_COUNT,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};

/// Rejection reasons for a word attempt. The display strings are exactly
/// the texts surfaced to the offending connection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AttemptError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("Invalid word selection")]
    InvalidSelection,
    #[error("Word already found")]
    WordAlreadyFound,
}

/// Dimensions and word count used when a fresh room is generated.
#[derive(Debug, Clone, Copy)]
pub struct RoomConfig {
    pub board_width: usize,
    pub board_height: usize,
    pub word_count: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            board_width: DEFAULT_BOARD_WIDTH,
            board_height: DEFAULT_BOARD_HEIGHT,
            word_count: DEFAULT_WORD_COUNT,
        }
    }
}

pub struct SessionRegistry {
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
    store: Arc<dyn SnapshotStore>,
    config: RoomConfig,
    /// Queue feeding the single snapshot writer task, so write-behind
    /// snapshots of one registry apply in the order they were taken.
    snapshot_tx: mpsc::UnboundedSender<RoomSnapshot>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self::with_config(store, RoomConfig::default())
    }

    /// Must be called from within a tokio runtime; the registry spawns its
    /// snapshot writer task on construction.
    pub fn with_config(store: Arc<dyn SnapshotStore>, config: RoomConfig) -> Self {
        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        Self::spawn_snapshot_writer(Arc::clone(&store), snapshot_rx);

        Self {
            rooms: RwLock::new(HashMap::new()),
            store,
            config,
            snapshot_tx,
        }
    }

    /// Drains queued snapshots until the registry is dropped. Failures are
    /// logged and gameplay continues memory-only.
    fn spawn_snapshot_writer(
        store: Arc<dyn SnapshotStore>,
        mut snapshot_rx: mpsc::UnboundedReceiver<RoomSnapshot>,
    ) {
        tokio::spawn(async move {
            while let Some(snapshot) = snapshot_rx.recv().await {
                let room_id = snapshot.id.clone();
                let bytes = match encode_snapshot(&snapshot) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Failed to encode snapshot for room {}: {}", room_id, e);
                        continue;
                    }
                };
                if let Err(e) = store.save(&room_id, bytes).await {
                    warn!("Failed to cache room {}: {}", room_id, e);
                }
            }
        });
    }

    /// Returns the live room for `room_id`, restoring it from the snapshot
    /// store when one exists, generating a fresh board otherwise. The room
    /// is registered in memory before this returns.
    pub async fn get_or_create(&self, room_id: &str) -> Arc<Mutex<Room>> {
        if let Some(room) = self.rooms.read().await.get(room_id) {
            return Arc::clone(room);
        }

        let mut rooms = self.rooms.write().await;
        // Another task may have created the room while we waited
        if let Some(room) = rooms.get(room_id) {
            return Arc::clone(room);
        }

        let room = match self.load_room(room_id).await {
            Some(room) => room,
            None => self.create_room(room_id),
        };
        let room = Arc::new(Mutex::new(room));
        rooms.insert(room_id.to_string(), Arc::clone(&room));
        room
    }

    /// Looks up a live room without creating one.
    pub async fn get_room(&self, room_id: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(room_id).map(Arc::clone)
    }

    /// Resolves or creates the room, attaches the player (idempotently) and
    /// schedules a snapshot write.
    pub async fn add_player_to_room(&self, room_id: &str, conn_id: &str, nickname: &str) -> Player {
        let room = self.get_or_create(room_id).await;
        let player = Player::new(
            conn_id.to_string(),
            nickname.to_string(),
            room_id.to_string(),
            player_color(conn_id),
            get_timestamp(),
        );

        let snapshot = {
            let mut room = room.lock().await;
            room.add_player(player.clone());
            room.snapshot()
        };
        self.persist(snapshot);

        player
    }

    /// No-op when the room is not live; a leave must never materialize a
    /// room just to remove someone from it.
    pub async fn remove_player_from_room(&self, room_id: &str, conn_id: &str) {
        let room = match self.get_room(room_id).await {
            Some(room) => room,
            None => return,
        };

        let snapshot = {
            let mut room = room.lock().await;
            room.remove_player(conn_id);
            room.snapshot()
        };
        self.persist(snapshot);
    }

    /// Runs a word attempt to completion under the room's lock: resolve the
    /// player, validate the selection, reject duplicates, record the find
    /// and credit the score. Exactly one of two racing identical attempts
    /// can succeed; the loser sees `WordAlreadyFound`.
    pub async fn process_word_attempt(
        &self,
        room_id: &str,
        attempt: &WordAttempt,
    ) -> Result<FoundWord, AttemptError> {
        let room = self
            .get_room(room_id)
            .await
            .ok_or(AttemptError::RoomNotFound)?;

        let (found_word, snapshot) = {
            let mut room = room.lock().await;

            let player = room
                .get_player(&attempt.player_id)
                .ok_or(AttemptError::PlayerNotFound)?;

            let word_match = validator::validate_attempt(attempt, &room.board, &room.placements)
                .ok_or(AttemptError::InvalidSelection)?;

            if room.is_word_found(&word_match.word) {
                return Err(AttemptError::WordAlreadyFound);
            }

            let found_word = FoundWord {
                word: word_match.word,
                player_id: attempt.player_id.clone(),
                player_nickname: player.nickname.clone(),
                player_color: player.color.clone(),
                start_x: attempt.start_x,
                start_y: attempt.start_y,
                end_x: attempt.end_x,
                end_y: attempt.end_y,
                found_at: get_timestamp(),
                points: word_match.points,
            };
            room.add_found_word(found_word.clone());

            (found_word, room.snapshot())
        };
        self.persist(snapshot);

        Ok(found_word)
    }

    pub async fn room_board(&self, room_id: &str) -> Option<Board> {
        match self.get_room(room_id).await {
            Some(room) => Some(room.lock().await.board.clone()),
            None => None,
        }
    }

    pub async fn room_ranking(&self, room_id: &str) -> Vec<PlayerRanking> {
        match self.get_room(room_id).await {
            Some(room) => room.lock().await.get_ranking(),
            None => Vec::new(),
        }
    }

    pub async fn room_stats(&self, room_id: &str) -> Option<GameStats> {
        match self.get_room(room_id).await {
            Some(room) => Some(room.lock().await.get_stats()),
            None => None,
        }
    }

    fn create_room(&self, room_id: &str) -> Room {
        let mut rng = thread_rng();
        let words = board::generate_word_list(self.config.word_count, &mut rng);
        let (board, placements) = board::generate(
            self.config.board_width,
            self.config.board_height,
            &words,
            &mut rng,
        );

        info!(
            "Created room {} ({}x{}, {} words placed)",
            room_id,
            self.config.board_width,
            self.config.board_height,
            placements.len()
        );
        Room::new(room_id.to_string(), board, placements, get_timestamp())
    }

    async fn load_room(&self, room_id: &str) -> Option<Room> {
        let bytes = match self.store.load(room_id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to load snapshot for room {}: {}", room_id, e);
                return None;
            }
        };

        match decode_snapshot(&bytes) {
            Ok(snapshot) => {
                info!("Restored room {} from snapshot", room_id);
                Some(Room::restore(snapshot))
            }
            Err(e) => {
                warn!("Failed to decode snapshot for room {}: {}", room_id, e);
                None
            }
        }
    }

    /// Fire-and-forget write-behind, queued after the room lock is already
    /// released so a slow store cannot stall gameplay.
    fn persist(&self, snapshot: RoomSnapshot) {
        if self.snapshot_tx.send(snapshot).is_err() {
            warn!("Snapshot writer is gone; dropping snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{MemorySnapshotStore, StoreError};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Store whose every operation fails, for degraded-mode coverage.
    struct FailingStore;

    #[async_trait]
    impl SnapshotStore for FailingStore {
        async fn save(&self, _room_id: &str, _value: Vec<u8>) -> Result<(), StoreError> {
            Err(StoreError::Backend("store offline".to_string()))
        }

        async fn load(&self, _room_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Backend("store offline".to_string()))
        }
    }

    fn test_registry(store: Arc<dyn SnapshotStore>) -> SessionRegistry {
        SessionRegistry::with_config(
            store,
            RoomConfig {
                board_width: 25,
                board_height: 25,
                word_count: 10,
            },
        )
    }

    /// Builds a winning attempt for the first placement of the room.
    async fn winning_attempt(registry: &SessionRegistry, room_id: &str, player_id: &str) -> WordAttempt {
        let room = registry.get_or_create(room_id).await;
        let room = room.lock().await;
        let placement = room.placements.first().expect("room placed no words").clone();

        WordAttempt {
            player_id: player_id.to_string(),
            start_x: placement.start_x,
            start_y: placement.start_y,
            end_x: placement.end_x(),
            end_y: placement.end_y(),
            selected_letters: placement.word.clone(),
        }
    }

    /// Waits until the write-behind queue has flushed a snapshot that
    /// already contains at least one found word. Writes are ordered, so
    /// once it shows up no older snapshot can overwrite it.
    async fn wait_for_found_word_snapshot(store: &MemorySnapshotStore, room_id: &str) {
        for _ in 0..200 {
            if let Some(bytes) = store.load(room_id).await.unwrap() {
                if !decode_snapshot(&bytes).unwrap().found_words.is_empty() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("snapshot with found word for {} never arrived", room_id);
    }

    #[tokio::test]
    async fn test_get_or_create_registers_and_reuses() {
        let registry = test_registry(Arc::new(MemorySnapshotStore::new()));

        let first = registry.get_or_create("lobby").await;
        let second = registry.get_or_create("lobby").await;
        assert!(Arc::ptr_eq(&first, &second));

        let room = first.lock().await;
        assert_eq!(room.board.width, 25);
        assert_eq!(room.board.height, 25);
        assert!(!room.placements.is_empty());
    }

    #[tokio::test]
    async fn test_join_attaches_player_with_palette_color() {
        let registry = test_registry(Arc::new(MemorySnapshotStore::new()));

        let player = registry.add_player_to_room("lobby", "conn-1", "alice").await;
        assert_eq!(player.id, "conn-1");
        assert_eq!(player.room_id, "lobby");
        assert_eq!(player.color, player_color("conn-1"));

        let room = registry.get_room("lobby").await.unwrap();
        assert!(room.lock().await.get_player("conn-1").is_some());
    }

    #[tokio::test]
    async fn test_word_attempt_full_cycle() {
        let registry = test_registry(Arc::new(MemorySnapshotStore::new()));
        registry.add_player_to_room("lobby", "conn-1", "alice").await;

        let attempt = winning_attempt(&registry, "lobby", "conn-1").await;
        let found = registry.process_word_attempt("lobby", &attempt).await.unwrap();
        assert_eq!(found.word, attempt.selected_letters);
        assert_eq!(found.points, validator::calculate_points(&found.word));
        assert_eq!(found.player_nickname, "alice");

        // The same selection a second time is a duplicate, not a re-award
        let duplicate = registry.process_word_attempt("lobby", &attempt).await;
        assert_eq!(duplicate.unwrap_err(), AttemptError::WordAlreadyFound);

        let room = registry.get_room("lobby").await.unwrap();
        assert_eq!(room.lock().await.get_player("conn-1").unwrap().score, found.points);
    }

    #[tokio::test]
    async fn test_attempt_errors() {
        let registry = test_registry(Arc::new(MemorySnapshotStore::new()));

        let attempt = WordAttempt {
            player_id: "conn-1".to_string(),
            start_x: 0,
            start_y: 0,
            end_x: 1,
            end_y: 0,
            selected_letters: "XX".to_string(),
        };
        let result = registry.process_word_attempt("nowhere", &attempt).await;
        assert_eq!(result.unwrap_err(), AttemptError::RoomNotFound);

        registry.add_player_to_room("lobby", "conn-2", "bob").await;
        let result = registry.process_word_attempt("lobby", &attempt).await;
        assert_eq!(result.unwrap_err(), AttemptError::PlayerNotFound);

        // Selection nowhere near a placement: geometrically plausible but
        // letters will not match the board walk or any hidden word
        let mut bogus = winning_attempt(&registry, "lobby", "conn-2").await;
        bogus.selected_letters = "QQQQQQ".to_string();
        let result = registry.process_word_attempt("lobby", &bogus).await;
        assert_eq!(result.unwrap_err(), AttemptError::InvalidSelection);
    }

    #[tokio::test]
    async fn test_remove_player_does_not_create_room() {
        let registry = test_registry(Arc::new(MemorySnapshotStore::new()));

        registry.remove_player_from_room("nowhere", "conn-1").await;
        assert!(registry.get_room("nowhere").await.is_none());
    }

    #[tokio::test]
    async fn test_room_restored_from_snapshot_store() {
        let store = Arc::new(MemorySnapshotStore::new());

        let (found, placements) = {
            let registry = test_registry(store.clone());
            registry.add_player_to_room("lobby", "conn-1", "alice").await;
            let attempt = winning_attempt(&registry, "lobby", "conn-1").await;
            let found = registry.process_word_attempt("lobby", &attempt).await.unwrap();
            wait_for_found_word_snapshot(&store, "lobby").await;

            let room = registry.get_room("lobby").await.unwrap();
            let placements = room.lock().await.placements.clone();
            (found, placements)
        };

        // A new registry over the same store picks the session back up
        let registry = test_registry(store.clone());
        let room = registry.get_or_create("lobby").await;
        let room = room.lock().await;

        assert_eq!(room.placements, placements);
        assert_eq!(room.found_words.len(), 1);
        assert_eq!(room.found_words[0].word, found.word);
        assert_eq!(room.get_player("conn-1").unwrap().score, found.points);
    }

    #[tokio::test]
    async fn test_store_failures_degrade_to_memory_only() {
        let registry = test_registry(Arc::new(FailingStore));

        registry.add_player_to_room("lobby", "conn-1", "alice").await;
        let attempt = winning_attempt(&registry, "lobby", "conn-1").await;
        let found = registry.process_word_attempt("lobby", &attempt).await;
        assert!(found.is_ok());

        let stats = registry.room_stats("lobby").await.unwrap();
        assert_eq!(stats.found_words, 1);
    }

    #[tokio::test]
    async fn test_accessors_for_unknown_room() {
        let registry = test_registry(Arc::new(MemorySnapshotStore::new()));

        assert!(registry.room_board("nowhere").await.is_none());
        assert!(registry.room_stats("nowhere").await.is_none());
        assert!(registry.room_ranking("nowhere").await.is_empty());
    }
}

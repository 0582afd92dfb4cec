//! Room aggregate: one board, its hidden placements, connected players and
//! the append-only list of claimed words
//!
//! A room owns all mutable per-session state and derives the scoreboard and
//! completion statistics from it. Players are kept in join order so ranking
//! ties break deterministically; re-adding a player id replaces the prior
//! entry in place. Found words are never removed, not even when the player
//! who claimed them leaves.
//!
//! The room itself is not synchronized; the registry wraps each room in its
//! own lock and serializes membership changes and word attempts through it.

use log::info;
use serde::{Deserialize, Serialize};
use shared::{Board, FoundWord, GameStats, Player, PlayerRanking, WordPlacement};

/// Serialized copy of a room's full state, shipped through the snapshot
/// store for warm-restart recovery.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub id: String,
    pub board: Board,
    pub placements: Vec<WordPlacement>,
    pub found_words: Vec<FoundWord>,
    pub players: Vec<Player>,
    pub created_at: u64,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub board: Board,
    pub placements: Vec<WordPlacement>,
    pub found_words: Vec<FoundWord>,
    /// Join order; upserts replace in place so the order is stable.
    players: Vec<Player>,
    pub created_at: u64,
    pub is_active: bool,
}

impl Room {
    pub fn new(id: String, board: Board, placements: Vec<WordPlacement>, created_at: u64) -> Self {
        Self {
            id,
            board,
            placements,
            found_words: Vec::new(),
            players: Vec::new(),
            created_at,
            is_active: true,
        }
    }

    /// Adds a player, replacing any prior entry with the same id. A re-join
    /// keeps the player's original position in the join order.
    pub fn add_player(&mut self, player: Player) {
        info!("Player {} ({}) joined room {}", player.id, player.nickname, self.id);
        if let Some(existing) = self.players.iter_mut().find(|p| p.id == player.id) {
            *existing = player;
        } else {
            self.players.push(player);
        }
    }

    /// Removes a player. Their found words stay on the room and no other
    /// player's score changes.
    pub fn remove_player(&mut self, player_id: &str) {
        if let Some(index) = self.players.iter().position(|p| p.id == player_id) {
            let player = self.players.remove(index);
            info!("Player {} ({}) left room {}", player.id, player.nickname, self.id);
        }
    }

    pub fn get_player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Appends a claimed word and credits the claimant if they are still in
    /// the room. A claimant who already left still counts toward room
    /// progress; their absence is not an error.
    pub fn add_found_word(&mut self, found_word: FoundWord) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == found_word.player_id) {
            player.add_score(found_word.points);
        }
        self.found_words.push(found_word);
    }

    /// Case-insensitive membership test against the claimed words.
    pub fn is_word_found(&self, word: &str) -> bool {
        self.found_words
            .iter()
            .any(|fw| fw.word.eq_ignore_ascii_case(word))
    }

    pub fn get_stats(&self) -> GameStats {
        let total_words = self.placements.len();
        let found_words = self.found_words.len();
        // A board that placed zero words counts as 0% complete rather than
        // dividing by zero.
        let completion_percentage = if total_words == 0 {
            0
        } else {
            ((found_words as f64 / total_words as f64) * 100.0).round() as u32
        };

        GameStats {
            total_words,
            found_words,
            total_players: self.players.len(),
            active_players: self.players.len(),
            completion_percentage,
        }
    }

    /// Scoreboard sorted by score descending. The sort is stable, so equal
    /// scores keep join order; `rank` is the 1-based position afterwards.
    pub fn get_ranking(&self) -> Vec<PlayerRanking> {
        let mut ranking: Vec<PlayerRanking> = self
            .players
            .iter()
            .map(|player| PlayerRanking {
                player_id: player.id.clone(),
                nickname: player.nickname.clone(),
                score: player.score,
                words_found: self
                    .found_words
                    .iter()
                    .filter(|fw| fw.player_id == player.id)
                    .count(),
                rank: 0,
            })
            .collect();

        ranking.sort_by(|a, b| b.score.cmp(&a.score));
        for (index, entry) in ranking.iter_mut().enumerate() {
            entry.rank = index + 1;
        }
        ranking
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            board: self.board.clone(),
            placements: self.placements.clone(),
            found_words: self.found_words.clone(),
            players: self.players.clone(),
            created_at: self.created_at,
            is_active: self.is_active,
        }
    }

    /// Rebuilds a room verbatim from a persisted snapshot.
    pub fn restore(snapshot: RoomSnapshot) -> Self {
        Self {
            id: snapshot.id,
            board: snapshot.board,
            placements: snapshot.placements,
            found_words: snapshot.found_words,
            players: snapshot.players,
            created_at: snapshot.created_at,
            is_active: snapshot.is_active,
        }
    }
}

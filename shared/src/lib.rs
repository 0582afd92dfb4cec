use serde::{Deserialize, Serialize};

pub const DEFAULT_BOARD_WIDTH: usize = 300;
pub const DEFAULT_BOARD_HEIGHT: usize = 1000;
pub const DEFAULT_WORD_COUNT: usize = 50;
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const BASE_POINTS_PER_LETTER: u32 = 10;
pub const LENGTH_BONUS_THRESHOLD: usize = 5;
pub const LENGTH_BONUS_PER_LETTER: u32 = 5;
pub const SNAPSHOT_TTL_SECS: u64 = 3600;

/// Fixed palette assigned to players by a deterministic hash of their
/// connection id, so a reconnecting player keeps their color.
pub const PLAYER_COLORS: [&str; 8] = [
    "#ef4444", "#3b82f6", "#10b981", "#f59e0b", "#8b5cf6", "#f97316", "#06b6d4", "#84cc16",
];

/// Letter grid for one room. Row-major, `cells[y][x]`, uppercase letters.
/// Immutable once generated for the lifetime of the room.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Vec<char>>,
}

impl Board {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height
    }

    pub fn letter_at(&self, x: i32, y: i32) -> Option<char> {
        if x < 0 || y < 0 {
            return None;
        }
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }
}

/// The four straight lines a word can be laid along.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Horizontal,
    Vertical,
    DiagonalDown,
    DiagonalUp,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::DiagonalDown,
        Direction::DiagonalUp,
    ];

    /// Unit step applied per letter along this direction.
    pub fn unit(&self) -> (i32, i32) {
        match self {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, 1),
            Direction::DiagonalDown => (1, 1),
            Direction::DiagonalUp => (1, -1),
        }
    }
}

/// A word secretly embedded in the board at generation time.
///
/// End coordinates are derived, not stored: the run covers
/// `start + i * unit(direction)` for `i` in `0..word.len()`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordPlacement {
    pub word: String,
    pub start_x: i32,
    pub start_y: i32,
    pub direction: Direction,
}

impl WordPlacement {
    pub fn end_x(&self) -> i32 {
        self.start_x + (self.word.len() as i32 - 1) * self.direction.unit().0
    }

    pub fn end_y(&self) -> i32 {
        self.start_y + (self.word.len() as i32 - 1) * self.direction.unit().1
    }
}

/// A connected player. `id` is the opaque connection identity assigned by
/// the transport; `score` only ever grows during a session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub nickname: String,
    pub room_id: String,
    pub color: String,
    pub score: u32,
    pub connected_at: u64,
}

impl Player {
    pub fn new(
        id: String,
        nickname: String,
        room_id: String,
        color: String,
        connected_at: u64,
    ) -> Self {
        Self {
            id,
            nickname,
            room_id,
            color,
            score: 0,
            connected_at,
        }
    }

    pub fn add_score(&mut self, points: u32) {
        self.score += points;
    }
}

/// Record of a successfully claimed word. Immutable once created and
/// appended to the room's found-word list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FoundWord {
    pub word: String,
    pub player_id: String,
    pub player_nickname: String,
    pub player_color: String,
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
    pub found_at: u64,
    pub points: u32,
}

/// One row of the room scoreboard. `rank` is the 1-based position after
/// sorting by score descending; ties keep join order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRanking {
    pub player_id: String,
    pub nickname: String,
    pub score: u32,
    pub words_found: usize,
    pub rank: usize,
}

/// A player's claimed selection of a line of cells. `player_id` is stamped
/// server-side from the connection identity, never trusted from the client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordAttempt {
    pub player_id: String,
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
    pub selected_letters: String,
}

/// Aggregate room progress broadcast after every join, leave and find.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_words: usize,
    pub found_words: usize,
    pub total_players: usize,
    pub active_players: usize,
    pub completion_percentage: u32,
}

/// Messages a client sends to the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientCommand {
    JoinRoom {
        room_id: String,
        nickname: String,
    },
    LeaveRoom {
        room_id: String,
    },
    WordAttempt {
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        selected_letters: String,
    },
}

/// Messages the server sends to one connection or to a whole room.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerEvent {
    PlayerJoined(Player),
    PlayerLeft { player_id: String },
    WordFound(FoundWord),
    RankingUpdated(Vec<PlayerRanking>),
    BoardUpdated(Board),
    GameStats(GameStats),
    Error { message: String },
}

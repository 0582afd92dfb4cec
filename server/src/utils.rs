use shared::PLAYER_COLORS;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Get current timestamp in milliseconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

// Derive a palette color from a connection id. The same id always maps to
// the same color, so a reconnecting player keeps theirs.
pub fn player_color(conn_id: &str) -> String {
    let hash: usize = conn_id.bytes().map(|b| b as usize).sum();
    PLAYER_COLORS[hash % PLAYER_COLORS.len()].to_string()
}

//! Thin session controller between the transport and the game engine
//!
//! Translates parsed client commands into registry operations and room
//! events into deliveries. The controller owns the connection-to-room
//! membership map and stamps the acting player's identity from the
//! connection, never from the payload. All deliveries go through the
//! `Outbound` seam, so the WebSocket transport and the test harness plug
//! in the same way.

use crate::registry::SessionRegistry;
use async_trait::async_trait;
use log::info;
use shared::{ClientCommand, ServerEvent, WordAttempt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Delivery contract the transport implements: one event to one
/// connection, or to every member of a room (optionally excluding one),
/// plus room subscription bookkeeping.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send_to(&self, conn_id: &str, event: &ServerEvent);
    async fn broadcast(&self, room_id: &str, event: &ServerEvent, exclude: Option<&str>);
    async fn join(&self, room_id: &str, conn_id: &str);
    async fn leave(&self, room_id: &str, conn_id: &str);
}

pub struct SessionController {
    registry: Arc<SessionRegistry>,
    outbound: Arc<dyn Outbound>,
    /// Which room each connection currently sits in.
    memberships: Mutex<HashMap<String, String>>,
}

impl SessionController {
    pub fn new(registry: Arc<SessionRegistry>, outbound: Arc<dyn Outbound>) -> Self {
        Self {
            registry,
            outbound,
            memberships: Mutex::new(HashMap::new()),
        }
    }

    /// Entry point for every parsed message from a connection.
    pub async fn handle_command(&self, conn_id: &str, command: ClientCommand) {
        match command {
            ClientCommand::JoinRoom { room_id, nickname } => {
                self.handle_join(conn_id, &room_id, &nickname).await;
            }
            ClientCommand::LeaveRoom { room_id } => {
                self.handle_leave(conn_id, &room_id).await;
            }
            ClientCommand::WordAttempt {
                start_x,
                start_y,
                end_x,
                end_y,
                selected_letters,
            } => {
                let attempt = WordAttempt {
                    player_id: conn_id.to_string(),
                    start_x,
                    start_y,
                    end_x,
                    end_y,
                    selected_letters,
                };
                self.handle_word_attempt(conn_id, attempt).await;
            }
        }
    }

    /// A dropped connection is an implicit leave from whatever room it was
    /// in; a connection that never joined needs no cleanup.
    pub async fn handle_disconnect(&self, conn_id: &str) {
        let room_id = self.memberships.lock().await.remove(conn_id);
        if let Some(room_id) = room_id {
            self.outbound.leave(&room_id, conn_id).await;
            self.registry.remove_player_from_room(&room_id, conn_id).await;
            self.notify_departure(&room_id, conn_id).await;
        }
    }

    async fn handle_join(&self, conn_id: &str, room_id: &str, nickname: &str) {
        let player = self
            .registry
            .add_player_to_room(room_id, conn_id, nickname)
            .await;
        self.memberships
            .lock()
            .await
            .insert(conn_id.to_string(), room_id.to_string());
        self.outbound.join(room_id, conn_id).await;

        let board = self.registry.room_board(room_id).await;
        let ranking = self.registry.room_ranking(room_id).await;
        let stats = self.registry.room_stats(room_id).await;

        // The joining connection gets the full room picture...
        self.outbound
            .send_to(conn_id, &ServerEvent::PlayerJoined(player.clone()))
            .await;
        if let Some(board) = board {
            self.outbound
                .send_to(conn_id, &ServerEvent::BoardUpdated(board))
                .await;
        }
        self.outbound
            .send_to(conn_id, &ServerEvent::RankingUpdated(ranking.clone()))
            .await;
        if let Some(stats) = stats {
            self.outbound
                .send_to(conn_id, &ServerEvent::GameStats(stats))
                .await;
        }

        // ...existing members only hear about the newcomer
        self.outbound
            .broadcast(room_id, &ServerEvent::PlayerJoined(player), Some(conn_id))
            .await;
        self.outbound
            .broadcast(
                room_id,
                &ServerEvent::RankingUpdated(ranking),
                Some(conn_id),
            )
            .await;
        if let Some(stats) = stats {
            self.outbound
                .broadcast(room_id, &ServerEvent::GameStats(stats), Some(conn_id))
                .await;
        }
    }

    async fn handle_leave(&self, conn_id: &str, room_id: &str) {
        self.outbound.leave(room_id, conn_id).await;
        self.memberships.lock().await.remove(conn_id);
        self.registry.remove_player_from_room(room_id, conn_id).await;
        self.notify_departure(room_id, conn_id).await;
    }

    async fn handle_word_attempt(&self, conn_id: &str, attempt: WordAttempt) {
        let room_id = match self.memberships.lock().await.get(conn_id).cloned() {
            Some(room_id) => room_id,
            None => {
                self.send_error(conn_id, "Not in a room").await;
                return;
            }
        };

        match self.registry.process_word_attempt(&room_id, &attempt).await {
            Ok(found_word) => {
                info!(
                    "Word {:?} found by {} in room {}",
                    found_word.word, found_word.player_nickname, room_id
                );
                self.outbound
                    .broadcast(&room_id, &ServerEvent::WordFound(found_word), None)
                    .await;
                let ranking = self.registry.room_ranking(&room_id).await;
                self.outbound
                    .broadcast(&room_id, &ServerEvent::RankingUpdated(ranking), None)
                    .await;
                if let Some(stats) = self.registry.room_stats(&room_id).await {
                    self.outbound
                        .broadcast(&room_id, &ServerEvent::GameStats(stats), None)
                        .await;
                }
            }
            // Rejections are expected traffic; only the offender hears back
            Err(error) => self.send_error(conn_id, &error.to_string()).await,
        }
    }

    /// Ranking and stats are recomputed after the member is already gone.
    async fn notify_departure(&self, room_id: &str, conn_id: &str) {
        self.outbound
            .broadcast(
                room_id,
                &ServerEvent::PlayerLeft {
                    player_id: conn_id.to_string(),
                },
                Some(conn_id),
            )
            .await;
        let ranking = self.registry.room_ranking(room_id).await;
        self.outbound
            .broadcast(
                room_id,
                &ServerEvent::RankingUpdated(ranking),
                Some(conn_id),
            )
            .await;
        if let Some(stats) = self.registry.room_stats(room_id).await {
            self.outbound
                .broadcast(room_id, &ServerEvent::GameStats(stats), Some(conn_id))
                .await;
        }
    }

    async fn send_error(&self, conn_id: &str, message: &str) {
        self.outbound
            .send_to(
                conn_id,
                &ServerEvent::Error {
                    message: message.to_string(),
                },
            )
            .await;
    }
}

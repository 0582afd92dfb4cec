//! WebSocket transport shell around the session controller
//!
//! One reader loop and one writer task per connection; JSON text frames
//! carry the shared message contract. The transport owns the connection
//! registry and the room membership sets, and implements the controller's
//! `Outbound` delivery seam over them. Everything game-related stays on the
//! other side of that seam.

use crate::controller::{Outbound, SessionController};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use shared::{ClientCommand, ServerEvent};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;

/// Connection senders plus room membership. Fan-out clones one encoded
/// frame per recipient; the per-connection writer task does the actual
/// socket I/O.
#[derive(Default)]
pub struct WsOutbound {
    senders: RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>,
    rooms: RwLock<HashMap<String, HashSet<String>>>,
}

impl WsOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    async fn register(&self, conn_id: &str, sender: mpsc::UnboundedSender<Message>) {
        self.senders
            .write()
            .await
            .insert(conn_id.to_string(), sender);
    }

    async fn unregister(&self, conn_id: &str) {
        self.senders.write().await.remove(conn_id);
    }

    fn encode(event: &ServerEvent) -> Option<Message> {
        match serde_json::to_string(event) {
            Ok(json) => Some(Message::Text(json)),
            Err(e) => {
                error!("Failed to encode server event: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Outbound for WsOutbound {
    async fn send_to(&self, conn_id: &str, event: &ServerEvent) {
        let message = match Self::encode(event) {
            Some(message) => message,
            None => return,
        };
        if let Some(sender) = self.senders.read().await.get(conn_id) {
            // A failed send means the writer task is gone; the read loop
            // will notice the closed connection and clean up.
            let _ = sender.send(message);
        }
    }

    async fn broadcast(&self, room_id: &str, event: &ServerEvent, exclude: Option<&str>) {
        let message = match Self::encode(event) {
            Some(message) => message,
            None => return,
        };
        let members: Vec<String> = match self.rooms.read().await.get(room_id) {
            Some(members) => members.iter().cloned().collect(),
            None => return,
        };

        let senders = self.senders.read().await;
        for member in members {
            if Some(member.as_str()) == exclude {
                continue;
            }
            if let Some(sender) = senders.get(&member) {
                let _ = sender.send(message.clone());
            }
        }
    }

    async fn join(&self, room_id: &str, conn_id: &str) {
        self.rooms
            .write()
            .await
            .entry(room_id.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    async fn leave(&self, room_id: &str, conn_id: &str) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room_id) {
            members.remove(conn_id);
            if members.is_empty() {
                rooms.remove(room_id);
            }
        }
    }
}

/// Accepting server: owns the listener and hands each connection its own
/// pair of tasks.
pub struct NetworkServer {
    listener: TcpListener,
    controller: Arc<SessionController>,
    outbound: Arc<WsOutbound>,
    next_conn_id: AtomicU64,
}

impl NetworkServer {
    pub async fn new(
        addr: &str,
        controller: Arc<SessionController>,
        outbound: Arc<WsOutbound>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            controller,
            outbound,
            next_conn_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Runs until the listener fails; per-connection errors
    /// never propagate past their own task.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let conn_id = format!("conn-{}", self.next_conn_id.fetch_add(1, Ordering::Relaxed));
            let controller = Arc::clone(&self.controller);
            let outbound = Arc::clone(&self.outbound);

            tokio::spawn(async move {
                handle_connection(stream, addr, conn_id, controller, outbound).await;
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    conn_id: String,
    controller: Arc<SessionController>,
    outbound: Arc<WsOutbound>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    info!("Connection {} established from {}", conn_id, addr);

    let (mut sink, mut frames) = ws.split();
    let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();
    outbound.register(&conn_id, sender).await;

    // Writer task drains this connection's outbound queue
    let writer = tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientCommand>(&text) {
                Ok(command) => controller.handle_command(&conn_id, command).await,
                Err(e) => {
                    warn!("Malformed message from {}: {}", conn_id, e);
                    outbound
                        .send_to(
                            &conn_id,
                            &ServerEvent::Error {
                                message: "Malformed message".to_string(),
                            },
                        )
                        .await;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Connection {} errored: {}", conn_id, e);
                break;
            }
        }
    }

    info!("Connection {} closed", conn_id);
    outbound.unregister(&conn_id).await;
    controller.handle_disconnect(&conn_id).await;
    writer.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::GameStats;

    fn stats_event() -> ServerEvent {
        ServerEvent::GameStats(GameStats {
            total_words: 1,
            found_words: 0,
            total_players: 1,
            active_players: 1,
            completion_percentage: 0,
        })
    }

    async fn connect(outbound: &WsOutbound, conn_id: &str) -> mpsc::UnboundedReceiver<Message> {
        let (sender, receiver) = mpsc::unbounded_channel();
        outbound.register(conn_id, sender).await;
        receiver
    }

    #[tokio::test]
    async fn test_send_to_reaches_one_connection() {
        let outbound = WsOutbound::new();
        let mut a = connect(&outbound, "conn-1").await;
        let mut b = connect(&outbound, "conn-2").await;

        outbound.send_to("conn-1", &stats_event()).await;

        let frame = a.try_recv().unwrap();
        match frame {
            Message::Text(json) => assert!(json.contains(r#""type":"game-stats""#)),
            _ => panic!("expected a text frame"),
        }
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_honors_membership_and_exclusion() {
        let outbound = WsOutbound::new();
        let mut a = connect(&outbound, "conn-1").await;
        let mut b = connect(&outbound, "conn-2").await;
        let mut c = connect(&outbound, "conn-3").await;

        outbound.join("lobby", "conn-1").await;
        outbound.join("lobby", "conn-2").await;
        // conn-3 never joined

        outbound
            .broadcast("lobby", &stats_event(), Some("conn-1"))
            .await;

        assert!(a.try_recv().is_err());
        assert!(b.try_recv().is_ok());
        assert!(c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_leave_stops_delivery() {
        let outbound = WsOutbound::new();
        let mut a = connect(&outbound, "conn-1").await;

        outbound.join("lobby", "conn-1").await;
        outbound.leave("lobby", "conn-1").await;
        outbound.broadcast("lobby", &stats_event(), None).await;

        assert!(a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_is_a_noop() {
        let outbound = WsOutbound::new();
        // Nothing to assert beyond "does not panic"
        outbound.send_to("conn-404", &stats_event()).await;
    }
}

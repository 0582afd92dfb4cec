//! # Word-Search Game Server Library
//!
//! This library provides the authoritative server implementation for the
//! real-time, room-based word-search game. Players share a grid of letters,
//! drag-select runs of cells, and the server alone decides whether a
//! selection claims one of the hidden words, crediting the first successful
//! claimant and broadcasting the updated room state to everyone in it.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Game State
//! Every room's board, hidden word placements, player roster and found-word
//! history live in server memory and nowhere else. Clients only ever see the
//! letter grid; the placement list stays server-side, and every claim is
//! re-validated against it geometrically and letter by letter.
//!
//! ### Room Sessions
//! Rooms spring into existence on first join, survive everyone leaving (so
//! players can reconnect), and are periodically snapshotted to a best-effort
//! store so a restarted process can pick sessions back up. In-memory state
//! stays authoritative while the process lives; the store is a warm-restart
//! aid with a TTL, not a source of truth.
//!
//! ### Concurrency Model
//! Each room serializes its own membership changes and word attempts behind
//! a per-room lock, which is what makes word credit at-most-once: of two
//! racing identical claims, exactly one is credited and the other is told
//! the word was already found. Different rooms never contend with each
//! other, and snapshot writes happen off the lock so a slow store cannot
//! stall gameplay.
//!
//! ## Module Organization
//!
//! ### Board Module (`board`)
//! Generates the letter grid: bounded random placement attempts per word
//! (dropping words that never fit), random-letter padding, and sampling of
//! the word list from a fixed dictionary.
//!
//! ### Validator Module (`validator`)
//! Checks a selection's bounds, straight-line geometry and board-letter
//! agreement, then matches it against the hidden placements in either
//! direction and prices the word.
//!
//! ### Room Module (`room`)
//! The room aggregate: players in join order, the append-only found-word
//! list, scoreboard and completion statistics, and snapshot conversion.
//!
//! ### Registry Module (`registry`)
//! The table of live rooms, the per-room critical sections, and the
//! read-through/write-behind snapshot plumbing.
//!
//! ### Controller Module (`controller`)
//! Thin translation between parsed client commands and registry calls, with
//! all deliveries routed through the `Outbound` seam.
//!
//! ### Network Module (`network`)
//! WebSocket transport: per-connection reader/writer tasks, JSON text
//! frames, connection registry and room-scoped broadcast fan-out.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::controller::SessionController;
//! use server::network::{NetworkServer, WsOutbound};
//! use server::registry::SessionRegistry;
//! use server::snapshot::MemorySnapshotStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemorySnapshotStore::new());
//!     let registry = Arc::new(SessionRegistry::new(store));
//!     let outbound = Arc::new(WsOutbound::new());
//!     let controller = Arc::new(SessionController::new(registry, outbound.clone()));
//!
//!     let server = NetworkServer::new("127.0.0.1:8080", controller, outbound).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod controller;
pub mod network;
pub mod registry;
pub mod room;
pub mod snapshot;
pub mod utils;
pub mod validator;

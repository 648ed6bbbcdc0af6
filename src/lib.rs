//! Simple DHT Library
//!
//! A key-value store spread over a ring of peer nodes with consistent hashing
//! (a simplified Chord overlay). Each node owns the arc of the SHA-1 space that
//! ends at its own id and serves the keys hashing into it.
//!
//! ## Architecture Modules
//! - **`membership`**: Node/key hashing, the ordered ring and its ownership lookup,
//!   and the lock-guarded ring view with the join state machine.
//! - **`protocol`**: Typed peer requests/responses, length-prefixed bincode framing,
//!   and the one-connection-per-call peer client.
//! - **`storage`**: The injected local key-value table and its in-memory implementation.
//! - **`router`**: Local-vs-remote decisions, the bootstrap join protocol, and
//!   cluster-wide scatter-gather for `*` queries and deletes.
//! - **`server`**: The peer listener that dispatches each inbound connection.
//! - **`api`**: HTTP endpoints for local callers.
//! - **`node`** / **`config`**: Wiring and command-line configuration for a running node.

pub mod api;
pub mod config;
pub mod membership;
pub mod node;
pub mod protocol;
pub mod router;
pub mod server;
pub mod storage;

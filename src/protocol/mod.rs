//! Peer Wire Protocol
//!
//! Request/response messages exchanged between ring members over TCP.
//!
//! Every call opens a fresh connection, writes one `Envelope` frame, reads one
//! `Response` frame and closes. There is no pipelining, multiplexing or pooling.

pub mod client;
pub mod codec;
pub mod types;

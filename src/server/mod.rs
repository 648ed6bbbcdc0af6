//! Peer Server
//!
//! Accepts inbound connections from other ring members and answers each one
//! with a single dispatch through the router.

pub mod listener;

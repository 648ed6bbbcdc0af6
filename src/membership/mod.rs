//! Ring Membership Module
//!
//! Places nodes and keys on a SHA-1 ring and tracks which peers are members.
//!
//! ## Core Mechanisms
//! - **Hashing**: `NodeId::hash_of` maps both node addresses and keys onto the same hex space.
//! - **Ownership**: A key belongs to the first member whose id is `>=` the key's id, wrapping
//!   around to the smallest id past the end of the ring.
//! - **Join**: New nodes announce themselves to a fixed bootstrap node, which re-broadcasts
//!   its full ring so every member converges on the same view. Members are never removed.

pub mod ring;
pub mod service;
pub mod types;

//! Request Router Module
//!
//! Turns insert/query/delete calls into local store operations or peer requests.
//!
//! ## Routing Rules
//! - **Single key**: Hash the key, look up its owner on the ring, serve locally or
//!   forward exactly one hop to the owner.
//! - **`@` (local)**: Served from this node's store, no network traffic.
//! - **`*` (all)**: Scatter-gather. Every member is asked concurrently for its
//!   entries (or to delete them) and the replies are combined.
//! - **Join**: Non-bootstrap nodes announce themselves to the bootstrap, which
//!   pushes its updated ring to every other member.

pub mod selector;
pub mod service;

#[cfg(test)]
mod tests;

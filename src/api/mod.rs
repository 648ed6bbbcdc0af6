//! Caller-Facing HTTP API
//!
//! Exposes insert/query/delete and a ring view to local callers over HTTP (axum).
//! Selectors in the path follow the router's syntax: a plain key, `*` for the
//! whole ring, `@` for this node only.

pub mod handlers;
pub mod protocol;

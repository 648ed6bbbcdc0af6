//! Local Storage Module
//!
//! The exact-match key-value table each node keeps for the keys it owns.
//!
//! The router only depends on the `LocalStore` trait; `MemoryStore` is the
//! in-process implementation used by the node binary and the tests.

pub mod memory;

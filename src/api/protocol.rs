//! HTTP API Protocol
//!
//! Endpoints and DTOs for local callers. Peers never use these; they talk the
//! binary protocol in `crate::protocol`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

use crate::membership::types::JoinState;

// --- API Endpoints ---

/// Store one key on its owner.
pub const ENDPOINT_INSERT: &str = "/insert";
/// Read a key, or every key with `*`, or this node's keys with `@`.
pub const ENDPOINT_QUERY: &str = "/query";
/// Delete a key, or every key with `*`, or this node's keys with `@`.
pub const ENDPOINT_DELETE: &str = "/delete";
/// This node's view of the ring.
pub const ENDPOINT_RING: &str = "/ring";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertResponse {
    /// `false` when the owner could not be reached.
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub entries: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberView {
    pub id: String,
    pub addr: SocketAddr,
}

/// Members are listed in ring order.
#[derive(Debug, Serialize, Deserialize)]
pub struct RingResponse {
    pub local: SocketAddr,
    pub state: JoinState,
    pub members: Vec<MemberView>,
}

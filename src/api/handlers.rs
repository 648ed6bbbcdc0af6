use axum::{
    Extension, Json, Router as HttpRouter,
    extract::Path,
    http::StatusCode,
    routing::{delete, get, post},
};
use std::sync::Arc;

use super::protocol::{
    DeleteResponse, ENDPOINT_DELETE, ENDPOINT_INSERT, ENDPOINT_QUERY, ENDPOINT_RING,
    InsertRequest, InsertResponse, MemberView, QueryResponse, RingResponse,
};
use crate::router::selector::KeySelector;
use crate::router::service::Router;

/// Builds the caller-facing HTTP routes around a node's router.
pub fn routes(router: Arc<Router>) -> HttpRouter {
    HttpRouter::new()
        .route(ENDPOINT_INSERT, post(handle_insert))
        .route(&format!("{}/:selector", ENDPOINT_QUERY), get(handle_query))
        .route(&format!("{}/:selector", ENDPOINT_DELETE), delete(handle_delete))
        .route(ENDPOINT_RING, get(handle_ring))
        .layer(Extension(router))
}

pub async fn handle_insert(
    Extension(router): Extension<Arc<Router>>,
    Json(req): Json<InsertRequest>,
) -> (StatusCode, Json<InsertResponse>) {
    match router.insert(req.key, req.value).await {
        Ok(()) => (StatusCode::OK, Json(InsertResponse { success: true })),
        Err(e) => {
            tracing::error!("Failed to insert: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(InsertResponse { success: false }),
            )
        }
    }
}

pub async fn handle_query(
    Extension(router): Extension<Arc<Router>>,
    Path(selector): Path<String>,
) -> (StatusCode, Json<QueryResponse>) {
    let selector = KeySelector::from(selector.as_str());

    let entries = router.query(&selector).await;
    tracing::debug!("QUERY {} returned {} entries", selector, entries.len());

    (StatusCode::OK, Json(QueryResponse { entries }))
}

pub async fn handle_delete(
    Extension(router): Extension<Arc<Router>>,
    Path(selector): Path<String>,
) -> (StatusCode, Json<DeleteResponse>) {
    let selector = KeySelector::from(selector.as_str());

    let deleted = router.delete(&selector).await;
    tracing::debug!("DELETE {} removed {} entries", selector, deleted);

    (StatusCode::OK, Json(DeleteResponse { deleted }))
}

pub async fn handle_ring(
    Extension(router): Extension<Arc<Router>>,
) -> (StatusCode, Json<RingResponse>) {
    let membership = router.membership();

    let members = membership
        .members()
        .await
        .into_iter()
        .map(|member| MemberView {
            id: member.id.0,
            addr: member.addr,
        })
        .collect();

    (
        StatusCode::OK,
        Json(RingResponse {
            local: membership.local.addr,
            state: membership.join_state().await,
            members,
        }),
    )
}

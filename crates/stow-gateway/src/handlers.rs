//! HTTP request handlers for the object and node APIs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::warn;

use crate::error::GatewayError;
use crate::{NodeState, ObjectState};

/// Longest accepted object key.
const MAX_KEY_LEN: usize = 32;

/// Whether `key` may name an object.
///
/// Keys are plain ASCII alphanumeric, one to [`MAX_KEY_LEN`] characters.
/// Everything below the gateway treats keys as opaque hash input, so this
/// is the only place the constraint is enforced.
fn valid_key(key: &str) -> bool {
    !key.is_empty() && key.len() <= MAX_KEY_LEN && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

// -----------------------------------------------------------------------
// Object API: PUT /object/{key}, GET /object/{key}, GET /health
// -----------------------------------------------------------------------

/// Store an object on whichever backend owns the key.
pub(crate) async fn route_put_object(
    State(state): State<ObjectState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, GatewayError> {
    if !valid_key(&key) {
        return Err(GatewayError::NotFound { key });
    }
    state.distributor.put_object(&key, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch an object from whichever backend owns the key.
pub(crate) async fn route_get_object(
    State(state): State<ObjectState>,
    Path(key): Path<String>,
) -> Result<Bytes, GatewayError> {
    if !valid_key(&key) {
        return Err(GatewayError::NotFound { key });
    }
    Ok(state.distributor.get_object(&key).await?)
}

/// Router liveness. Answers as long as the process serves requests,
/// regardless of how many backends are registered.
pub(crate) async fn router_health() -> &'static str {
    "ok"
}

// -----------------------------------------------------------------------
// Node API: PUT /object/{key}, GET /object/{key}, GET /health
// -----------------------------------------------------------------------

/// Store an object in this node's local store.
pub(crate) async fn node_put_object(
    State(state): State<NodeState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, GatewayError> {
    if !valid_key(&key) {
        return Err(GatewayError::NotFound { key });
    }
    state.store.put(&key, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch an object from this node's local store.
pub(crate) async fn node_get_object(
    State(state): State<NodeState>,
    Path(key): Path<String>,
) -> Result<Bytes, GatewayError> {
    if !valid_key(&key) {
        return Err(GatewayError::NotFound { key });
    }
    match state.store.get(&key).await? {
        Some(data) => Ok(data),
        None => Err(GatewayError::NotFound { key }),
    }
}

/// The node's own health, as routers probe it. A store that cannot
/// answer its healthcheck reports unhealthy rather than erroring.
pub(crate) async fn node_health(State(state): State<NodeState>) -> (StatusCode, &'static str) {
    match state.store.healthcheck().await {
        Ok(true) => (StatusCode::OK, "ok"),
        Ok(false) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        Err(error) => {
            warn!(%error, "healthcheck failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    }
}

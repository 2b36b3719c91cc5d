//! HTTP surfaces for stow.
//!
//! Two axum routers, one per process role:
//!
//! - [`object_api`] — the router's public face. `PUT /object/{key}` and
//!   `GET /object/{key}` hand the payload to a
//!   [`Distributor`](stow_router::Distributor), which picks the owning
//!   backend. `GET /health` answers liveness.
//! - [`node_api`] — the storage node's face, the wire protocol
//!   [`HttpStore`](stow_store::HttpStore) speaks. Object routes serve one
//!   local [`ObjectStore`]; `GET /health` reports the store's own
//!   healthcheck and stays outside authentication so routers can always
//!   probe it.
//!
//! ## Authentication
//!
//! The object API is open. The node API optionally requires
//! `Authorization: Bearer <access_key>:<secret_key>` on object routes when
//! constructed with a [`NodeAuth`]; comparison is constant-time via the
//! `subtle` crate.

mod error;
mod handlers;


use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use subtle::ConstantTimeEq;
use tracing::warn;

use stow_router::Distributor;
use stow_store::ObjectStore;

pub use error::GatewayError;

/// Largest accepted object payload.
const MAX_OBJECT_BYTES: usize = 64 * 1024 * 1024;

/// Shared state for object-API handlers.
#[derive(Clone)]
pub(crate) struct ObjectState {
    /// The router picking a backend per key.
    pub distributor: Arc<Distributor>,
}

/// Credentials a storage node requires on its object routes.
#[derive(Clone)]
pub struct NodeAuth {
    /// Expected bearer token, `access_key:secret_key`.
    token: String,
}

impl NodeAuth {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            token: format!("{}:{}", access_key.into(), secret_key.into()),
        }
    }
}

/// Shared state for node-API handlers.
#[derive(Clone)]
pub(crate) struct NodeState {
    /// The one local store this node serves.
    pub store: Arc<dyn ObjectStore>,
    /// Required credentials, or `None` for an open node.
    pub auth: Option<NodeAuth>,
}

/// Authentication middleware for node object routes.
///
/// When the node carries credentials, every request must supply
/// `Authorization: Bearer <access_key>:<secret_key>`. Token comparison is
/// constant-time.
async fn node_auth_middleware(
    State(state): State<NodeState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(auth) = &state.auth else {
        return Ok(next.run(request).await);
    };

    let authorized = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| auth.token.as_bytes().ct_eq(token.as_bytes()).into());

    if !authorized {
        warn!("unauthorized node request");
        return Err(GatewayError::AccessDenied);
    }

    Ok(next.run(request).await)
}

/// Build the router-process API over a [`Distributor`].
pub fn object_api(distributor: Arc<Distributor>) -> Router {
    let state = ObjectState { distributor };

    Router::new()
        .route(
            "/object/:key",
            put(handlers::route_put_object).get(handlers::route_get_object),
        )
        .route("/health", get(handlers::router_health))
        .layer(DefaultBodyLimit::max(MAX_OBJECT_BYTES))
        .with_state(state)
}

/// Build the storage-node API over one local store.
///
/// `auth` of `None` leaves the object routes open. `/health` is never
/// authenticated.
pub fn node_api(store: Arc<dyn ObjectStore>, auth: Option<NodeAuth>) -> Router {
    let state = NodeState { store, auth };

    let object_routes = Router::new()
        .route(
            "/object/:key",
            put(handlers::node_put_object).get(handlers::node_get_object),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            node_auth_middleware,
        ));

    Router::new()
        .merge(object_routes)
        .route("/health", get(handlers::node_health))
        .layer(DefaultBodyLimit::max(MAX_OBJECT_BYTES))
        .with_state(state)
}

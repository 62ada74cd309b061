//! JSON admin surface over a configuration store.
//!
//! # Routes
//! ```text
//! GET  /admin/status              store settings and watcher state
//! GET  /admin/config?focus=       values, form layout and navigation
//! POST /admin/config              apply (auto-apply) or preview a form
//! POST /admin/config/confirm      apply a previewed form
//! POST /admin/config/items/add    append to a list
//! POST /admin/config/items/remove remove from a list
//! POST /admin/reload              re-read the file
//! POST /admin/save                write the file
//! ```
//!
//! # Design Decisions
//! - Every route sits behind the `Authenticator`
//! - Field errors come back as 422 with one entry per field

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{Config, Store};
use self::auth::{require_auth, Authenticator};
use self::handlers::*;

pub use auth::{AllowAll, BearerToken};
pub use handlers::ApiError;

/// State injected into admin handlers.
#[derive(Clone)]
pub struct AdminState<T> {
    pub store: Store<T>,
}

pub fn router<T: Config>(store: Store<T>, auth: Arc<dyn Authenticator>) -> Router {
    Router::new()
        .route("/admin/status", get(get_status::<T>))
        .route("/admin/config", get(get_config::<T>).post(submit_config::<T>))
        .route("/admin/config/confirm", post(confirm_config::<T>))
        .route("/admin/config/items/add", post(add_item::<T>))
        .route("/admin/config/items/remove", post(remove_item::<T>))
        .route("/admin/reload", post(reload::<T>))
        .route("/admin/save", post(save::<T>))
        .layer(middleware::from_fn_with_state(auth, require_auth))
        .layer(TraceLayer::new_for_http())
        .with_state(AdminState { store })
}

//! REST API definitions.

pub mod goal;
pub mod progress;
pub mod session;
pub mod user;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

/// Builds a [`Router`] serving the REST API.
///
/// Routes under `/api/protected` require an authorized session, except the
/// token management ones, which work with the raw session cookies directly.
pub fn router() -> Router {
    let protected = Router::new()
        .route(
            "/goals",
            get(goal::fetch).post(goal::create).put(goal::update),
        )
        .route("/progress", get(progress::list).post(progress::record))
        .route("/progress/:id", delete(progress::remove))
        .route_layer(middleware::from_fn(crate::session::authorize))
        .route("/checkToken", post(session::check))
        .route("/refreshToken", post(session::refresh));

    Router::new()
        .route("/api/user/register", post(user::register))
        .route("/api/user/login", post(user::login))
        .route("/api/user", get(user::list))
        .route("/api/user/:id", get(user::fetch))
        .nest("/api/protected/user", protected)
}

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with every user and blog endpoint.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handler::index))
        .route("/user/create", post(handler::create_user))
        .route("/user/login", post(handler::login))
        .route("/user/remove", post(handler::remove_user))
        .route("/user/change_password", post(handler::change_password))
        .route("/user/getall", get(handler::all_users))
        .route("/user/random", get(handler::random_user))
        .route("/blog/add", post(handler::add_post))
        .route("/blog/get/:blog_id", get(handler::get_post))
        .route("/blog/remove", post(handler::remove_post))
        .route("/blog/update", post(handler::update_post))
        .route("/blog/random", get(handler::random_post))
        .route("/blog/getall", get(handler::all_posts))
        .route("/blog/:username/getall", get(handler::user_posts))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

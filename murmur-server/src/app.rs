use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Settings;
use crate::cors;
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// Build the HTTP router with every route and layer attached
pub fn router(state: AppState, settings: &Settings) -> Router {
    Router::new()
        // Health check
        .route("/health", get(api::health))
        // Authentication routes
        .route("/signup", post(api::auth::signup))
        .route("/signin", post(api::auth::signin))
        .route("/logout", post(api::auth::logout))
        .route("/me", get(api::auth::me))
        .route("/me/posts", get(api::auth::my_posts))
        // Feed and post routes
        .route("/posts", get(api::posts::global_feed))
        .route("/followingposts", get(api::posts::following_feed))
        .route("/addpost", post(api::posts::create_post))
        .route("/addcomment", post(api::posts::create_comment))
        .route(
            "/posts/:id",
            get(api::posts::get_post)
                .patch(api::posts::update_post)
                .delete(api::posts::delete_post),
        )
        .route(
            "/posts/:id/like",
            get(api::likes::like_status)
                .post(api::likes::like_post)
                .delete(api::likes::unlike_post),
        )
        // Social graph routes
        .route(
            "/follow/:username",
            post(api::follow::follow).delete(api::follow::unfollow),
        )
        .route("/follow/:username/status", get(api::follow::follow_status))
        .route(
            "/followers/:username",
            axum::routing::delete(api::follow::remove_follower),
        )
        // User routes
        .route("/users/search", get(api::users::search_users))
        .route("/users/:username", get(api::users::get_profile))
        .route("/users/:username/posts", get(api::users::user_posts))
        .route("/users/:username/followers", get(api::users::list_followers))
        .route("/users/:username/following", get(api::users::list_following))
        // Search
        .route("/search", get(api::search::search_posts))
        .fallback(api::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors::layer(&settings.cors))
        .with_state(state)
}

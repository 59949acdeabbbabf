pub mod admin;
pub mod auth;
pub mod progress;
pub mod questions;
pub mod quiz;
pub mod utility;

use std::time::Duration;

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post, put},
};
use cyberquest_core::Data;
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Who may call a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    Public,
    Bearer,
    Author,
    Admin,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct RouteMeta {
    pub method: &'static str,
    pub path: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub access: RouteAccess,
}

pub const ROUTES: &[RouteMeta] = &[
    utility::index::META,
    utility::health::META,
    auth::register::META,
    auth::login::META,
    auth::me::META,
    quiz::next::META,
    quiz::submit::META,
    quiz::hint::META,
    progress::levels::META,
    progress::stats::META,
    progress::leaderboard::META,
    questions::create::META,
    questions::get::META,
    questions::generate::META,
    questions::upload::META,
    admin::questions::LIST_META,
    admin::questions::UPDATE_META,
    admin::questions::DELETE_META,
    admin::users::LIST_META,
    admin::users::GET_META,
    admin::users::ROLE_META,
    admin::users::DELETE_META,
];

fn api_routes() -> Router<Data> {
    Router::new()
        .route("/", get(utility::index::index))
        .route("/health", get(utility::health::health))
        .route("/auth/register", post(auth::register::register))
        .route("/auth/login", post(auth::login::login))
        .route("/auth/me", get(auth::me::me))
        .route("/quiz", get(quiz::next::next_question))
        .route("/quiz/submit", post(quiz::submit::submit))
        .route("/quiz/hint/{question_id}", get(quiz::hint::hint))
        .route("/levels", get(progress::levels::levels))
        .route("/stats", get(progress::stats::stats))
        .route("/leaderboard", get(progress::leaderboard::leaderboard))
        .route("/questions", post(questions::create::create))
        .route("/questions/generate", post(questions::generate::generate))
        .route("/questions/upload-csv", post(questions::upload::upload_csv))
        .route("/questions/{id}", get(questions::get::get_question))
        .route("/admin/questions", get(admin::questions::list))
        .route(
            "/admin/questions/{id}",
            put(admin::questions::update).delete(admin::questions::delete),
        )
        .route("/admin/users", get(admin::users::list))
        .route(
            "/admin/users/{id}",
            get(admin::users::get_user).delete(admin::users::delete),
        )
        .route("/admin/users/{id}/role", put(admin::users::update_role))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

pub fn router(data: Data) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(data)
}

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use cyberquest_core::{
    ApiResult, Data,
    accounts::{self, AuthResponse, RegisterBody},
};

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "POST",
    path: "/api/auth/register",
    desc: "Creates a learner account and returns a token.",
    category: "auth",
    access: RouteAccess::Public,
};

pub async fn register(
    State(data): State<Data>,
    payload: Result<Json<RegisterBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(body) = payload?;
    let response = accounts::register(&data, body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

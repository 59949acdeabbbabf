use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use cyberquest_core::{
    ApiResult, Data,
    accounts::{self, AuthResponse, LoginBody},
};

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "POST",
    path: "/api/auth/login",
    desc: "Exchanges username and password for a token.",
    category: "auth",
    access: RouteAccess::Public,
};

pub async fn login(
    State(data): State<Data>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(body) = payload?;
    Ok(Json(accounts::login(&data, body).await?))
}

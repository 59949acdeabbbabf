use axum::{Json, extract::State};
use cyberquest_core::{
    ApiResult, Caller, Data,
    accounts::{self, AccountView},
};

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/auth/me",
    desc: "Returns the calling account.",
    category: "auth",
    access: RouteAccess::Bearer,
};

pub async fn me(State(data): State<Data>, caller: Caller) -> ApiResult<Json<AccountView>> {
    Ok(Json(accounts::me(&data.db, caller.user_id).await?))
}

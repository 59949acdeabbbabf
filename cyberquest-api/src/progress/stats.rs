use axum::{Json, extract::State};
use cyberquest_core::{
    ApiResult, Caller, Data,
    stats::{UserStats, user_stats},
};

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/stats",
    desc: "XP, accuracy, level progress and recent answers for the caller.",
    category: "progress",
    access: RouteAccess::Bearer,
};

pub async fn stats(State(data): State<Data>, caller: Caller) -> ApiResult<Json<UserStats>> {
    let account = caller.access(&data.db).await?.into_account();
    Ok(Json(user_stats(&data.db, &account).await?))
}

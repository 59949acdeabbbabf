use axum::{Json, extract::State};
use cyberquest_core::{
    ApiResult, Caller, Data,
    progression::leveling::{LevelStatus, level_overview},
};
use cyberquest_database::impls::{levels::load_ladder, questions::question_counts_by_level};
use serde::Serialize;

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/levels",
    desc: "Lists every level with its unlock status for the caller.",
    category: "progress",
    access: RouteAccess::Bearer,
};

#[derive(Serialize)]
pub struct LevelsResponse {
    levels: Vec<LevelStatus>,
    user_xp: i64,
    current_level: i32,
}

pub async fn levels(State(data): State<Data>, caller: Caller) -> ApiResult<Json<LevelsResponse>> {
    let access = caller.access(&data.db).await?;
    let ladder = load_ladder(&data.db).await?;
    let counts = question_counts_by_level(&data.db).await?;

    let account = access.account();
    Ok(Json(LevelsResponse {
        levels: level_overview(&ladder, account, &counts),
        user_xp: account.total_xp,
        current_level: account.current_level,
    }))
}

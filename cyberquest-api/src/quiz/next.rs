use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use cyberquest_core::{
    ApiResult, Caller, Data,
    progression::selection::{QuizQuery, QuizSelection, select_question},
};

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/quiz",
    desc: "Serves one question, preferring ones the caller has not answered.",
    category: "quiz",
    access: RouteAccess::Bearer,
};

pub async fn next_question(
    State(data): State<Data>,
    caller: Caller,
    query: Result<Query<QuizQuery>, QueryRejection>,
) -> ApiResult<Json<QuizSelection>> {
    let Query(query) = query?;
    let request = query.parse()?;
    let access = caller.access(&data.db).await?;

    let selection = select_question(&data.db, &data.policy, &access, &request).await?;
    Ok(Json(selection))
}

use axum::{
    Json,
    extract::{Path, State},
};
use cyberquest_core::{ApiError, ApiResult, Caller, Data};
use cyberquest_database::impls::questions::get_hint;
use serde::Serialize;
use tracing::debug;

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/quiz/hint/{question_id}",
    desc: "Returns the hint for a question. Each hint used costs XP on submission.",
    category: "quiz",
    access: RouteAccess::Bearer,
};

#[derive(Serialize)]
pub struct HintResponse {
    question_id: i64,
    hint: String,
}

pub async fn hint(
    State(data): State<Data>,
    caller: Caller,
    Path(question_id): Path<i64>,
) -> ApiResult<Json<HintResponse>> {
    let hint = get_hint(&data.db, question_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_owned()))?
        .ok_or_else(|| ApiError::NotFound("No hint available for this question".to_owned()))?;

    debug!(user_id = caller.user_id, question_id, "served hint");
    Ok(Json(HintResponse { question_id, hint }))
}

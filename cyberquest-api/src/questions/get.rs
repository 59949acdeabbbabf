use axum::{
    Json,
    extract::{Path, State},
};
use cyberquest_core::{ApiError, ApiResult, Caller, Data};
use cyberquest_database::{impls::questions::get_supported_question, model::question::Question};

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/questions/{id}",
    desc: "Fetches a question with its answer and options as stored.",
    category: "questions",
    access: RouteAccess::Author,
};

pub async fn get_question(
    State(data): State<Data>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Question>> {
    caller.access(&data.db).await?.require_author()?;

    let question = get_supported_question(&data.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_owned()))?;
    Ok(Json(question))
}

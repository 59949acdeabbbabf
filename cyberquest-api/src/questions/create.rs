use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use cyberquest_core::{
    ApiResult, Caller, Data,
    authoring::{QuestionDraft, create_from_draft},
};
use cyberquest_database::model::question::Question;

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "POST",
    path: "/api/questions",
    desc: "Creates a question.",
    category: "questions",
    access: RouteAccess::Author,
};

pub async fn create(
    State(data): State<Data>,
    caller: Caller,
    payload: Result<Json<QuestionDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Question>)> {
    let author = caller.access(&data.db).await?.require_author()?;
    let Json(draft) = payload?;

    let question = create_from_draft(&data.db, author.account().id, &draft).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use cyberquest_core::{
    ApiResult, Caller, Data,
    authoring::{GenerateBody, generate_and_store},
};
use cyberquest_database::model::question::Question;

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "POST",
    path: "/api/questions/generate",
    desc: "Generates a question with the configured model and stores it.",
    category: "questions",
    access: RouteAccess::Author,
};

pub async fn generate(
    State(data): State<Data>,
    caller: Caller,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Question>)> {
    let author = caller.access(&data.db).await?.require_author()?;
    let Json(body) = payload?;

    let question = generate_and_store(
        &data.db,
        data.generator.as_ref(),
        author.account().id,
        &body,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

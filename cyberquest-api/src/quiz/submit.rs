use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use cyberquest_core::{
    ApiResult, Caller, Data,
    progression::{
        SubmissionOutcome,
        submission::{SubmissionBody, submit_answer},
    },
};
use cyberquest_utils::time::today_utc;

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "POST",
    path: "/api/quiz/submit",
    desc: "Grades an answer and applies XP, streak and level changes.",
    category: "quiz",
    access: RouteAccess::Bearer,
};

pub async fn submit(
    State(data): State<Data>,
    caller: Caller,
    payload: Result<Json<SubmissionBody>, JsonRejection>,
) -> ApiResult<Json<SubmissionOutcome>> {
    let Json(body) = payload?;
    let submission = body.validate()?;

    let outcome = submit_answer(
        &data.db,
        &data.policy,
        caller.user_id,
        &submission,
        today_utc(),
    )
    .await?;
    Ok(Json(outcome))
}

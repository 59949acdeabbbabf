use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use cyberquest_core::{ApiError, ApiResult, Caller, Data, authoring::QuestionDraft};
use cyberquest_database::{
    impls::questions::{
        delete_question, get_supported_question, list_supported_questions, update_question,
    },
    model::question::Question,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{RouteAccess, RouteMeta};

pub const LIST_META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/admin/questions",
    desc: "All supported questions, newest first.",
    category: "admin",
    access: RouteAccess::Admin,
};

pub const UPDATE_META: RouteMeta = RouteMeta {
    method: "PUT",
    path: "/api/admin/questions/{id}",
    desc: "Replaces a question.",
    category: "admin",
    access: RouteAccess::Admin,
};

pub const DELETE_META: RouteMeta = RouteMeta {
    method: "DELETE",
    path: "/api/admin/questions/{id}",
    desc: "Deletes a question and the answers recorded for it.",
    category: "admin",
    access: RouteAccess::Admin,
};

#[derive(Serialize)]
pub struct QuestionList {
    questions: Vec<Question>,
}

pub async fn list(State(data): State<Data>, caller: Caller) -> ApiResult<Json<QuestionList>> {
    caller.access(&data.db).await?.require_admin()?;
    Ok(Json(QuestionList {
        questions: list_supported_questions(&data.db).await?,
    }))
}

pub async fn update(
    State(data): State<Data>,
    caller: Caller,
    Path(id): Path<i64>,
    payload: Result<Json<QuestionDraft>, JsonRejection>,
) -> ApiResult<Json<Question>> {
    caller.access(&data.db).await?.require_admin()?;
    let Json(draft) = payload?;
    let question = draft.validate().map_err(ApiError::Validation)?;

    if !update_question(&data.db, id, &question).await? {
        return Err(ApiError::NotFound("Question not found".to_owned()));
    }
    info!(question_id = id, admin_id = caller.user_id, "updated question");

    let updated = get_supported_question(&data.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_owned()))?;
    Ok(Json(updated))
}

pub async fn delete(
    State(data): State<Data>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    caller.access(&data.db).await?.require_admin()?;

    if !delete_question(&data.db, id).await? {
        return Err(ApiError::NotFound("Question not found".to_owned()));
    }
    info!(question_id = id, admin_id = caller.user_id, "deleted question");

    Ok(Json(json!({ "message": "Question deleted" })))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cyberquest_database::model::question::{Difficulty, Question, QuestionType};

    use super::QuestionList;

    #[test]
    fn listing_wraps_questions() {
        let list = QuestionList {
            questions: vec![Question {
                id: 3,
                question_text: "Is WPA2 stronger than WEP?".to_owned(),
                question_type: QuestionType::TrueFalse,
                options: Some(vec!["True".to_owned(), "False".to_owned()]),
                correct_answer: "True".to_owned(),
                category: "wireless".to_owned(),
                difficulty: Difficulty::Easy,
                hint: None,
                level_required: 1,
                time_limit: 30,
                created_by: None,
                created_at: Utc::now(),
            }],
        };

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["questions"][0]["id"], 3);
        assert_eq!(json["questions"][0]["question_type"], "true_false");
        assert_eq!(json["questions"][0]["options"][1], "False");
    }
}

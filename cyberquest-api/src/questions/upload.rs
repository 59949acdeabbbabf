use axum::{
    Json,
    extract::{Multipart, State},
};
use cyberquest_core::{
    ApiError, ApiResult, Caller, Data,
    import::{ImportReport, import_questions},
};

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "POST",
    path: "/api/questions/upload-csv",
    desc: "Imports questions from the CSV in multipart field `file`.",
    category: "questions",
    access: RouteAccess::Author,
};

pub async fn upload_csv(
    State(data): State<Data>,
    caller: Caller,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    let author = caller.access(&data.db).await?.require_author()?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::BadRequest(err.body_text()))?;
            file = Some(bytes);
            break;
        }
    }

    let bytes = file.ok_or_else(|| ApiError::field("file", "a CSV file is required"))?;
    let report = import_questions(&data.db, author.account().id, &bytes).await?;
    Ok(Json(report))
}

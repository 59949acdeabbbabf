use axum::{Json, extract::State};
use cyberquest_core::{ApiError, ApiResult, Data};
use serde_json::{Value, json};
use tracing::warn;

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/health",
    desc: "Liveness check including a database round-trip.",
    category: "utility",
    access: RouteAccess::Public,
};

pub async fn health(State(data): State<Data>) -> ApiResult<Json<Value>> {
    if let Err(err) = data.db.ping().await {
        warn!(?err, "health check could not reach the database");
        return Err(ApiError::Unavailable("Database unavailable".to_owned()));
    }

    Ok(Json(json!({
        "status": "ok",
        "database": "ok",
        "generator": data.generator.is_some(),
    })))
}

use axum::Json;
use serde::Serialize;

use crate::{ROUTES, RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api",
    desc: "Lists every API route.",
    category: "utility",
    access: RouteAccess::Public,
};

#[derive(Serialize)]
pub struct ApiIndex {
    name: &'static str,
    version: &'static str,
    routes: &'static [RouteMeta],
}

pub async fn index() -> Json<ApiIndex> {
    Json(ApiIndex {
        name: "cyberquest",
        version: env!("CARGO_PKG_VERSION"),
        routes: ROUTES,
    })
}

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use cyberquest_core::{ApiResult, Data};
use cyberquest_database::{impls::leaderboard::top_learners, model::user::LeaderboardEntry};
use cyberquest_utils::parse::parse_positive_count;
use serde::{Deserialize, Serialize};

use crate::{RouteAccess, RouteMeta};

pub const META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/leaderboard",
    desc: "Learners ranked by XP. Admin accounts are left out.",
    category: "progress",
    access: RouteAccess::Public,
};

const DEFAULT_LIMIT: u32 = 50;

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    limit: Option<String>,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    users: Vec<LeaderboardEntry>,
}

pub async fn leaderboard(
    State(data): State<Data>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> ApiResult<Json<LeaderboardResponse>> {
    let Query(query) = query?;
    let limit = parse_positive_count(query.limit.as_deref(), DEFAULT_LIMIT);

    Ok(Json(LeaderboardResponse {
        users: top_learners(&data.db, limit).await?,
    }))
}

#[cfg(test)]
mod tests {
    use cyberquest_database::model::user::LeaderboardEntry;

    use super::LeaderboardResponse;

    #[test]
    fn ranked_learners_are_listed_under_users() {
        let response = LeaderboardResponse {
            users: vec![LeaderboardEntry {
                rank: 1,
                id: 5,
                username: "trinity".to_owned(),
                total_xp: 420,
                current_level: 3,
            }],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("leaderboard").is_none());
        assert_eq!(json["users"][0]["username"], "trinity");
        assert_eq!(json["users"][0]["total_xp"], 420);
        assert_eq!(json["users"][0]["rank"], 1);
    }
}

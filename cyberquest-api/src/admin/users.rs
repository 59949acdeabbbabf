use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use cyberquest_core::{ApiError, ApiResult, Caller, Data};
use cyberquest_database::{
    impls::{
        progress::answer_totals,
        users::{self, delete_user, list_users, set_role},
    },
    model::{
        progress::AnswerTotals,
        user::{Role, UserAccount},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::{RouteAccess, RouteMeta};

pub const LIST_META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/admin/users",
    desc: "All users by XP, highest first.",
    category: "admin",
    access: RouteAccess::Admin,
};

pub const GET_META: RouteMeta = RouteMeta {
    method: "GET",
    path: "/api/admin/users/{id}",
    desc: "One user with answer totals.",
    category: "admin",
    access: RouteAccess::Admin,
};

pub const ROLE_META: RouteMeta = RouteMeta {
    method: "PUT",
    path: "/api/admin/users/{id}/role",
    desc: "Sets a user's role.",
    category: "admin",
    access: RouteAccess::Admin,
};

pub const DELETE_META: RouteMeta = RouteMeta {
    method: "DELETE",
    path: "/api/admin/users/{id}",
    desc: "Deletes a user with their answers and authored questions.",
    category: "admin",
    access: RouteAccess::Admin,
};

#[derive(Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    user: UserAccount,
    #[serde(flatten)]
    totals: AnswerTotals,
}

#[derive(Deserialize)]
pub struct RoleBody {
    role: Option<String>,
}

/// Whether an admin may give `target_id` the role `role`. Admins cannot
/// drop their own admin role.
fn check_role_change(caller_id: i64, target_id: i64, role: Role) -> ApiResult<()> {
    if caller_id == target_id && role != Role::Admin {
        return Err(ApiError::Forbidden(
            "You cannot remove your own admin role".to_owned(),
        ));
    }
    Ok(())
}

fn check_deletion(caller_id: i64, target_id: i64) -> ApiResult<()> {
    if caller_id == target_id {
        return Err(ApiError::Forbidden(
            "You cannot delete your own account".to_owned(),
        ));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct UserList {
    users: Vec<UserAccount>,
}

pub async fn list(State(data): State<Data>, caller: Caller) -> ApiResult<Json<UserList>> {
    caller.access(&data.db).await?.require_admin()?;
    Ok(Json(UserList {
        users: list_users(&data.db).await?,
    }))
}

pub async fn get_user(
    State(data): State<Data>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserDetail>> {
    caller.access(&data.db).await?.require_admin()?;

    let user = users::get_user(&data.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;
    let totals = answer_totals(&data.db, id).await?;

    Ok(Json(UserDetail { user, totals }))
}

pub async fn update_role(
    State(data): State<Data>,
    caller: Caller,
    Path(id): Path<i64>,
    payload: Result<Json<RoleBody>, JsonRejection>,
) -> ApiResult<Json<UserAccount>> {
    caller.access(&data.db).await?.require_admin()?;
    let Json(body) = payload?;

    let role = body
        .role
        .as_deref()
        .and_then(Role::parse)
        .ok_or_else(|| ApiError::field("role", "role must be one of learner, instructor, admin"))?;
    check_role_change(caller.user_id, id, role)?;

    if !set_role(&data.db, id, role).await? {
        return Err(ApiError::NotFound("User not found".to_owned()));
    }
    info!(user_id = id, %role, admin_id = caller.user_id, "changed user role");

    let user = users::get_user(&data.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;
    Ok(Json(user))
}

pub async fn delete(
    State(data): State<Data>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    caller.access(&data.db).await?.require_admin()?;
    check_deletion(caller.user_id, id)?;

    if !delete_user(&data.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_owned()));
    }
    info!(user_id = id, admin_id = caller.user_id, "deleted user");

    Ok(Json(json!({ "message": "User deleted" })))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use cyberquest_core::ApiError;
    use cyberquest_database::model::user::{Role, UserAccount};

    use super::{UserList, check_deletion, check_role_change};

    #[test]
    fn admins_keep_their_own_admin_role() {
        assert!(matches!(
            check_role_change(1, 1, Role::Learner),
            Err(ApiError::Forbidden(_))
        ));
        assert!(check_role_change(1, 1, Role::Admin).is_ok());
        assert!(check_role_change(1, 2, Role::Learner).is_ok());
    }

    #[test]
    fn admins_cannot_delete_themselves() {
        assert!(matches!(check_deletion(3, 3), Err(ApiError::Forbidden(_))));
        assert!(check_deletion(3, 4).is_ok());
    }

    #[test]
    fn listing_wraps_users() {
        let list = UserList {
            users: vec![UserAccount {
                id: 2,
                username: "neo".to_owned(),
                email: "neo@example.com".to_owned(),
                total_xp: 80,
                role: Role::Instructor,
                current_level: 1,
                daily_streak: 2,
                last_activity_date: None,
                created_at: Utc::now(),
            }],
        };

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["users"][0]["username"], "neo");
        assert_eq!(json["users"][0]["role"], "instructor");
    }
}

use askama::Template;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::access::policy;
use crate::db::models::User;
use crate::db::users;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, PendingFlash};
use crate::flash::{self, Flash};
use crate::routes::home::page;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/admin.html")]
pub struct AdminTemplate {
    pub username: String,
    pub user_id: i64,
    pub is_admin: bool,
    pub users: Vec<User>,
    pub flash: Option<Flash>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_page))
        .route("/admin/users/{id}/delete", post(delete_user))
}

/// GET /admin — every account, admin only.
async fn admin_page(
    State(state): State<AppState>,
    user: CurrentUser,
    PendingFlash(flash): PendingFlash,
) -> AppResult<Response> {
    policy::require_admin(&user)?;

    let all_users = {
        let conn = state.db.get()?;
        users::list(&conn)?
    };

    let template = AdminTemplate {
        username: user.username,
        user_id: user.id,
        is_admin: true,
        users: all_users,
        flash: flash.clone(),
    };
    Ok(page(template, &flash))
}

/// POST /admin/users/{id}/delete — cascades over the user's posts and
/// the account in one transaction. Admins cannot delete themselves.
async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    policy::can_delete_user(&user, id)?;

    {
        let mut conn = state.db.get()?;
        users::delete_cascade(&mut conn, id)?;
    }
    tracing::info!("User {} deleted account {}", user.username, id);

    Ok(flash::redirect(
        "/admin",
        Flash::success(format!(
            "User (ID: {}) and all their posts have been deleted.",
            id
        )),
    ))
}

use askama::Template;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use crate::access::policy;
use crate::db::models::User;
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, PendingFlash};
use crate::fetch;
use crate::flash::{self, Flash};
use crate::routes::home::page;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub username: String,
    pub user_id: i64,
    pub is_admin: bool,
    pub profile: User,
    pub flash: Option<Flash>,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_pic_url: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/profile/{id}", get(profile_page).post(update_profile))
}

/// GET /profile/{id} — NotFound before the ownership rule, so probing
/// ids as a non-admin cannot distinguish "absent" from "not yours".
async fn profile_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    PendingFlash(flash): PendingFlash,
) -> AppResult<Response> {
    let profile = {
        let conn = state.db.get()?;
        users::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?
    };

    policy::can_touch_profile(&user, id)?;

    let is_admin = user.is_admin();
    let template = ProfileTemplate {
        username: user.username,
        user_id: user.id,
        is_admin,
        profile,
        flash: flash.clone(),
    };
    Ok(page(template, &flash))
}

/// POST /profile/{id} — the name fields commit unconditionally; the
/// picture URL commits only after the probe succeeds. A failed probe
/// reports its own message while the name update stands.
async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let first_name = form.first_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let last_name = form.last_name.as_deref().map(str::trim).filter(|s| !s.is_empty());

    {
        let conn = state.db.get()?;
        users::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
        policy::can_touch_profile(&user, id)?;

        users::update_names(&conn, id, first_name, last_name)?;
    }

    // The probe runs outside any store handle: the names above are
    // already committed and the picture write happens afterwards.
    let pic_url = form
        .profile_pic_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let flash = match pic_url {
        Some(url) => match fetch::probe_image(&state.http, url).await {
            Ok(()) => {
                let conn = state.db.get()?;
                users::update_profile_pic(&conn, id, url)?;
                Flash::success("Profile picture updated!")
            }
            Err(e) => Flash::error(e.to_string()),
        },
        None => Flash::success("Profile updated successfully!"),
    };

    Ok(flash::redirect(&format!("/profile/{}", id), flash))
}

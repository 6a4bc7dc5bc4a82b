use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::{password, session};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::{MaybeUser, PendingFlash};
use crate::flash::{self, Flash};
use crate::routes::home::page;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub flash: Option<Flash>,
}

// -- Forms --

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub retype_password: String,
}

// -- Cookie helpers --

fn session_cookie(cookie_name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        cookie_name, token, max_age_secs
    )
}

fn clear_session_cookie(cookie_name: &str) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        cookie_name
    )
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(login_page))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
}

// -- Handlers --

/// GET / — the login page. Authenticated visitors go straight to the feed.
async fn login_page(
    maybe_user: MaybeUser,
    PendingFlash(flash): PendingFlash,
) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/home").into_response());
    }

    Ok(page(LoginTemplate { flash: flash.clone() }, &flash))
}

/// POST /login — check credentials, open a session, set the cookie.
async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let credentials = {
        let conn = state.db.get()?;
        users::find_credentials(&conn, form.username.trim())?
    };

    let user = match credentials {
        Some((user, hash)) if password::verify(&form.password, &hash) => user,
        _ => {
            return Ok(flash::redirect(
                "/",
                Flash::error("Invalid username or password. Please try again."),
            ));
        }
    };

    let token = session::create_session(&state.db, &user, state.config.auth.session_hours)?;
    tracing::info!("User {} logged in", user.username);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/home".to_string()),
            (
                header::SET_COOKIE,
                session_cookie(
                    &state.config.auth.cookie_name,
                    &token,
                    state.config.auth.session_hours,
                ),
            ),
        ],
    )
        .into_response())
}

/// POST /register — validate, hash, insert with role `user`. A taken
/// username is a recoverable conflict, surfaced as a flash on the login
/// page like every other registration failure.
async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();

    if username.is_empty() || form.password.is_empty() || form.retype_password.is_empty() {
        return Err(AppError::Validation("All fields are required.".into()));
    }
    if form.password != form.retype_password {
        return Err(AppError::Validation("Passwords do not match.".into()));
    }

    let password_hash = password::hash(&form.password)?;
    {
        let conn = state.db.get()?;
        users::create(&conn, &username, &password_hash)?;
    }
    tracing::info!("Registered new user {}", username);

    Ok(flash::redirect(
        "/",
        Flash::success("You were successfully registered! Please log in."),
    ))
}

/// POST /logout — drop the session row and expire the cookie.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = cookie_value(&headers, &state.config.auth.cookie_name) {
        session::delete_session(&state.db, token)?;
    }

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (
                header::SET_COOKIE,
                clear_session_cookie(&state.config.auth.cookie_name),
            ),
        ],
    )
        .into_response())
}

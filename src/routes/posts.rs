use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::access::policy;
use crate::db::models::{Post, PostView, Visibility};
use crate::db::posts;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::flash::{self, Flash};
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub username: String,
    pub user_id: i64,
    pub is_admin: bool,
    pub post: PostView,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "pages/new_post.html")]
pub struct NewPostTemplate {
    pub username: String,
    pub user_id: i64,
    pub is_admin: bool,
}

#[derive(Template)]
#[template(path = "pages/edit_post.html")]
pub struct EditPostTemplate {
    pub username: String,
    pub user_id: i64,
    pub is_admin: bool,
    pub post: Post,
}

// -- Forms --

/// Title, content and visibility are all a client may supply. There is
/// deliberately no author field: authorship always comes from the session.
#[derive(Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub visibility: Option<String>,
}

// -- Router --

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/post/new", get(new_post_page).post(create_post))
        .route("/post/{id}", get(view_post))
        .route("/post/{id}/edit", get(edit_post_page).post(update_post))
        .route("/post/{id}/delete", post(delete_post))
}

// -- Handlers --

/// GET /post/{id} — a single post. Missing id resolves to NotFound
/// before any visibility rule runs.
async fn view_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let mut post = posts::get_view(&conn, id)?.ok_or(AppError::NotFound)?;

    policy::can_read_post(&user, post.author_id, post.visibility)?;
    post.created_at = crate::routes::home::parse_and_format_time(&post.created_at);

    let can_edit = policy::can_edit_post(&user, post.author_id).is_ok();
    let is_admin = user.is_admin();
    Ok(Html(PostTemplate {
        username: user.username,
        user_id: user.id,
        is_admin,
        post,
        can_edit,
    })
    .into_response())
}

async fn new_post_page(user: CurrentUser) -> AppResult<Response> {
    let is_admin = user.is_admin();
    Ok(Html(NewPostTemplate {
        username: user.username,
        user_id: user.id,
        is_admin,
    })
    .into_response())
}

/// POST /post/new — author is always the session user; an unrecognized
/// visibility value falls back to public.
async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let visibility = Visibility::parse(form.visibility.as_deref().unwrap_or(""));
    {
        let conn = state.db.get()?;
        posts::create(&conn, user.id, form.title.trim(), &form.content, visibility)?;
    }

    Ok(Redirect::to("/home").into_response())
}

async fn edit_post_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = posts::get(&conn, id)?.ok_or(AppError::NotFound)?;

    policy::can_edit_post(&user, post.author_id)?;

    let is_admin = user.is_admin();
    Ok(Html(EditPostTemplate {
        username: user.username,
        user_id: user.id,
        is_admin,
        post,
    })
    .into_response())
}

/// POST /post/{id}/edit — NotFound first, then the mutate rule. Only
/// title/content/visibility change; id and author are immutable.
async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    {
        let conn = state.db.get()?;
        let post = posts::get(&conn, id)?.ok_or(AppError::NotFound)?;
        policy::can_edit_post(&user, post.author_id)?;

        let visibility = Visibility::parse(form.visibility.as_deref().unwrap_or(""));
        posts::update(&conn, id, form.title.trim(), &form.content, visibility)?;
    }

    Ok(Redirect::to(&format!("/post/{}", id)).into_response())
}

/// POST /post/{id}/delete — single irreversible removal, same gate as edit.
async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    {
        let conn = state.db.get()?;
        let post = posts::get(&conn, id)?.ok_or(AppError::NotFound)?;
        policy::can_edit_post(&user, post.author_id)?;

        posts::delete(&conn, id)?;
    }
    tracing::info!("Post {} deleted by {}", id, user.username);

    Ok(flash::redirect(
        "/home",
        Flash::success("Post deleted successfully."),
    ))
}

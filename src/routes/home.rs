use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;

use crate::access::PostScope;
use crate::db::models::PostView;
use crate::db::posts;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, PendingFlash};
use crate::flash::{self, Flash};
use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Render a page, clearing the one-shot flash cookie when it showed one.
pub fn page<T: Template>(template: T, flash: &Option<Flash>) -> Response {
    if flash.is_some() {
        (
            AppendHeaders([(header::SET_COOKIE, flash::clear_cookie())]),
            Html(template),
        )
            .into_response()
    } else {
        Html(template).into_response()
    }
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub username: String,
    pub user_id: i64,
    pub is_admin: bool,
    pub search_query: String,
    pub my_posts: Vec<PostView>,
    pub public_posts: Vec<PostView>,
    pub flash: Option<Flash>,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub search: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/home", get(feed))
}

/// The feed page: the session's own listing (every author, for admins)
/// next to the public feed, optionally filtered by title.
async fn feed(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<FeedQuery>,
    PendingFlash(flash): PendingFlash,
) -> AppResult<Response> {
    let my_scope = PostScope::dashboard(&user);
    let feed_scope = PostScope::public_feed(query.search.as_deref());

    let (my_posts, public_posts) = {
        let conn = state.db.get()?;
        (posts::list(&conn, &my_scope)?, posts::list(&conn, &feed_scope)?)
    };

    let template = HomeTemplate {
        username: user.username.clone(),
        user_id: user.id,
        is_admin: user.is_admin(),
        search_query: query.search.unwrap_or_default(),
        my_posts: humanize_times(my_posts),
        public_posts: humanize_times(public_posts),
        flash: flash.clone(),
    };

    Ok(page(template, &flash))
}

// --- Time formatting ---

fn humanize_times(posts: Vec<PostView>) -> Vec<PostView> {
    posts
        .into_iter()
        .map(|mut p| {
            p.created_at = parse_and_format_time(&p.created_at);
            p
        })
        .collect()
}

pub fn parse_and_format_time(db_time: &str) -> String {
    NaiveDateTime::parse_from_str(db_time, "%Y-%m-%d %H:%M:%S")
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|_| db_time.to_string())
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let now = Utc::now().naive_utc();
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

//! One-shot user-visible messages, carried in a short-lived cookie and
//! cleared when the next page renders them.

use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub const FLASH_COOKIE: &str = "tinta_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
        }
    }

    fn parse(s: &str) -> Level {
        match s {
            "success" => Level::Success,
            _ => Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Flash {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Flash {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// Set-Cookie value carrying a flash message. Message text is
/// percent-encoded: raw spaces and semicolons are invalid in cookie
/// values per RFC 6265.
pub fn set_cookie(flash: &Flash) -> String {
    let value = format!(
        "{}:{}",
        flash.level.as_str(),
        urlencoding::encode(&flash.message)
    );
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age=60",
        FLASH_COOKIE, value
    )
}

pub fn clear_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", FLASH_COOKIE)
}

/// 303 redirect that queues a flash message for the next page.
pub fn redirect(to: &str, flash: Flash) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, to.to_string()),
            (header::SET_COOKIE, set_cookie(&flash)),
        ],
    )
        .into_response()
}

/// Read the pending flash message from request headers, if any.
pub fn take(parts: &Parts) -> Option<Flash> {
    let raw = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == FLASH_COOKIE {
                Some(val)
            } else {
                None
            }
        })?;

    decode(raw)
}

fn decode(raw: &str) -> Option<Flash> {
    if raw.is_empty() {
        return None;
    }
    let (level, message) = raw.split_once(':')?;
    let message = urlencoding::decode(message).ok()?;
    if message.is_empty() {
        return None;
    }
    Some(Flash {
        level: Level::parse(level),
        message: message.into_owned(),
    })
}

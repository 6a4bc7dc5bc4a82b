use rand::Rng;
use rusqlite::params;

use crate::db::models::{Role, User};
use crate::error::AppResult;
use crate::state::DbPool;

/// What a session row asserts about its holder, exactly as captured at
/// login. Never re-derived from the users table while the session lives.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user: &User, hours: u64) -> AppResult<String> {
    let conn = pool.get()?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, username, role, token, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now', ?6))",
        params![
            id,
            user.id,
            user.username,
            user.role.as_str(),
            token,
            format!("+{} hours", hours)
        ],
    )?;

    Ok(token)
}

/// Look up a live session by token. Expired rows are treated as absent.
pub fn find_by_token(pool: &DbPool, token: &str) -> AppResult<Option<SessionUser>> {
    let conn = pool.get()?;

    let result = conn.query_row(
        "SELECT user_id, username, role FROM sessions
         WHERE token = ?1 AND expires_at > datetime('now')",
        params![token],
        |row| {
            Ok(SessionUser {
                user_id: row.get(0)?,
                username: row.get(1)?,
                role: Role::parse(&row.get::<_, String>(2)?),
            })
        },
    );

    match result {
        Ok(session) => Ok(Some(session)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Role, User};
use crate::error::{AppError, AppResult};

fn map_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        role: Role::parse(&row.get::<_, String>(2)?),
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        profile_pic_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const USER_COLUMNS: &str =
    "id, username, role, first_name, last_name, profile_pic_url, created_at";

/// Insert a new user with role `user`. A uniqueness violation on the
/// username surfaces as the recoverable `UsernameTaken` kind.
pub fn create(conn: &Connection, username: &str, password_hash: &str) -> AppResult<i64> {
    let result = conn.execute(
        "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, 'user')",
        params![username, password_hash],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) => {
            Err(AppError::UsernameTaken(username.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            map_user,
        )
        .optional()?;
    Ok(user)
}

/// Fetch a user together with their stored credential hash, for login.
pub fn find_credentials(conn: &Connection, username: &str) -> AppResult<Option<(User, String)>> {
    let result = conn
        .query_row(
            &format!(
                "SELECT {}, password_hash FROM users WHERE username = ?1",
                USER_COLUMNS
            ),
            params![username],
            |row| {
                let user = map_user(row)?;
                let hash: String = row.get(7)?;
                Ok((user, hash))
            },
        )
        .optional()?;
    Ok(result)
}

/// Name fields commit unconditionally; the picture URL has its own,
/// probe-gated write below.
pub fn update_names(
    conn: &Connection,
    id: i64,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET first_name = ?1, last_name = ?2 WHERE id = ?3",
        params![first_name, last_name, id],
    )?;
    Ok(())
}

pub fn update_profile_pic(conn: &Connection, id: i64, url: &str) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET profile_pic_url = ?1 WHERE id = ?2",
        params![url, id],
    )?;
    Ok(())
}

/// All users, oldest account first. Admin management view.
pub fn list(conn: &Connection) -> AppResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
    let users = stmt
        .query_map([], map_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Delete a user and every post they authored, as one transaction:
/// a crash mid-sequence can never leave orphaned posts or a half-deleted
/// account. Deleting an id with no row is a no-op success.
pub fn delete_cascade(conn: &mut Connection, user_id: i64) -> AppResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM posts WHERE author_id = ?1", params![user_id])?;
    tx.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
    tx.commit()?;
    Ok(())
}

/// Seed the `admin` account if it does not exist. The only path that
/// creates an admin role.
pub fn bootstrap_admin(conn: &Connection, password_hash: &str) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO users (username, password_hash, role) VALUES ('admin', ?1, 'admin')",
        params![password_hash],
    )?;
    Ok(())
}

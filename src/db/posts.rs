use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::access::PostScope;
use crate::db::models::{Post, PostView, Visibility};
use crate::error::AppResult;

fn map_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        visibility: Visibility::parse(&row.get::<_, String>(4)?),
        created_at: row.get(5)?,
    })
}

/// Insert a post. The author id always comes from the caller's session,
/// never from request input.
pub fn create(
    conn: &Connection,
    author_id: i64,
    title: &str,
    content: &str,
    visibility: Visibility,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO posts (author_id, title, content, visibility) VALUES (?1, ?2, ?3, ?4)",
        params![author_id, title, content, visibility.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Option<Post>> {
    let post = conn
        .query_row(
            "SELECT id, author_id, title, content, visibility, created_at
             FROM posts WHERE id = ?1",
            params![id],
            map_post,
        )
        .optional()?;
    Ok(post)
}

/// A single post joined with its author's username, for the post page.
pub fn get_view(conn: &Connection, id: i64) -> AppResult<Option<PostView>> {
    let view = conn
        .query_row(
            "SELECT p.id, p.author_id, u.username, p.title, p.content, p.visibility, p.created_at
             FROM posts p JOIN users u ON u.id = p.author_id
             WHERE p.id = ?1",
            params![id],
            map_view,
        )
        .optional()?;
    Ok(view)
}

/// Title, content and visibility are the only mutable fields; id and
/// author_id never change after creation.
pub fn update(
    conn: &Connection,
    id: i64,
    title: &str,
    content: &str,
    visibility: Visibility,
) -> AppResult<()> {
    conn.execute(
        "UPDATE posts SET title = ?1, content = ?2, visibility = ?3 WHERE id = ?4",
        params![title, content, visibility.as_str(), id],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(())
}

fn map_view(row: &rusqlite::Row) -> rusqlite::Result<PostView> {
    Ok(PostView {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        visibility: Visibility::parse(&row.get::<_, String>(5)?),
        created_at: row.get(6)?,
    })
}

/// List posts visible under a scope, newest first, row id as the stable
/// tiebreaker within equal timestamps.
pub fn list(conn: &Connection, scope: &PostScope) -> AppResult<Vec<PostView>> {
    let (where_sql, bind) = scope.filter();
    let sql = format!(
        "SELECT p.id, p.author_id, u.username, p.title, p.content, p.visibility, p.created_at
         FROM posts p JOIN users u ON u.id = p.author_id
         {}
         ORDER BY p.created_at DESC, p.id",
        where_sql
    );

    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params_from_iter(bind), map_view)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

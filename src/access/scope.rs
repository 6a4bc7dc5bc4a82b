//! Visibility-filtered query construction: the one place the set of
//! listable posts is decided. Listings never post-filter rows.

use rusqlite::types::Value;

use crate::extractors::CurrentUser;

/// Which posts a listing may return.
#[derive(Debug, Clone, PartialEq)]
pub enum PostScope {
    /// Posts authored by one user, any visibility.
    Own(i64),
    /// Every post by every author. Admin's management view only.
    All,
    /// Public posts only, optionally title-filtered. Identical for every
    /// role: an admin's elevated visibility does not extend to the feed.
    PublicFeed { search: Option<String> },
}

impl PostScope {
    /// The "my posts" listing: admins see every author, everyone else
    /// sees only their own rows.
    pub fn dashboard(user: &CurrentUser) -> PostScope {
        if user.is_admin() {
            PostScope::All
        } else {
            PostScope::Own(user.id)
        }
    }

    /// The public feed. An empty or whitespace search term means no
    /// title filter at all.
    pub fn public_feed(search: Option<&str>) -> PostScope {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        PostScope::PublicFeed { search }
    }

    /// WHERE clause plus bound parameters for this scope. Title matching
    /// is a case-insensitive substring (SQLite LIKE).
    pub fn filter(&self) -> (&'static str, Vec<Value>) {
        match self {
            PostScope::Own(author_id) => {
                ("WHERE p.author_id = ?1", vec![Value::Integer(*author_id)])
            }
            PostScope::All => ("", Vec::new()),
            PostScope::PublicFeed { search: None } => ("WHERE p.visibility = 'public'", Vec::new()),
            PostScope::PublicFeed {
                search: Some(term),
            } => (
                "WHERE p.visibility = 'public' AND p.title LIKE ?1",
                vec![Value::Text(format!("%{}%", term))],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;

    fn user(id: i64, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            username: format!("user{}", id),
            role,
        }
    }

    #[test]
    fn dashboard_scope_for_plain_user_is_own_rows() {
        assert_eq!(PostScope::dashboard(&user(7, Role::User)), PostScope::Own(7));
    }

    #[test]
    fn dashboard_scope_for_admin_is_everything() {
        assert_eq!(PostScope::dashboard(&user(7, Role::Admin)), PostScope::All);
    }

    #[test]
    fn feed_scope_ignores_blank_search() {
        assert_eq!(
            PostScope::public_feed(None),
            PostScope::PublicFeed { search: None }
        );
        assert_eq!(
            PostScope::public_feed(Some("")),
            PostScope::PublicFeed { search: None }
        );
        assert_eq!(
            PostScope::public_feed(Some("   ")),
            PostScope::PublicFeed { search: None }
        );
    }

    #[test]
    fn feed_scope_trims_search_term() {
        assert_eq!(
            PostScope::public_feed(Some(" rust ")),
            PostScope::PublicFeed {
                search: Some("rust".to_string())
            }
        );
    }

    #[test]
    fn own_filter_binds_author() {
        let (sql, params) = PostScope::Own(3).filter();
        assert_eq!(sql, "WHERE p.author_id = ?1");
        assert_eq!(params, vec![Value::Integer(3)]);
    }

    #[test]
    fn all_filter_is_unrestricted() {
        let (sql, params) = PostScope::All.filter();
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn feed_filter_is_public_only() {
        let (sql, params) = PostScope::public_feed(None).filter();
        assert_eq!(sql, "WHERE p.visibility = 'public'");
        assert!(params.is_empty());
    }

    #[test]
    fn feed_filter_with_search_wraps_wildcards() {
        let (sql, params) = PostScope::public_feed(Some("rust")).filter();
        assert!(sql.contains("p.visibility = 'public'"));
        assert!(sql.contains("p.title LIKE ?1"));
        assert_eq!(params, vec![Value::Text("%rust%".to_string())]);
    }
}

//! The authorization rule engine: given (who, action, target), decide
//! allow or deny — and which deny.
//!
//! Callers must resolve missing entities to `NotFound` *before* invoking
//! any rule here, so a nonexistent id never leaks existence through a
//! different denial kind.

use crate::db::models::Visibility;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;

/// Reading a single post: public posts are open to any session; private
/// posts only to their author or an admin. Denial is the soft
/// `PrivatePost` kind (redirect + notice, not a hard 403).
pub fn can_read_post(user: &CurrentUser, author_id: i64, visibility: Visibility) -> AppResult<()> {
    if visibility == Visibility::Public || author_id == user.id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::PrivatePost)
    }
}

/// Editing or deleting a post: author or admin only. Hard denial.
pub fn can_edit_post(user: &CurrentUser, author_id: i64) -> AppResult<()> {
    if author_id == user.id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Reading or updating a profile: the owner or an admin only. Hard denial.
pub fn can_touch_profile(user: &CurrentUser, target_user_id: i64) -> AppResult<()> {
    if user.id == target_user_id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Admin-only surfaces: user listing, user deletion.
pub fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Deleting a user: admin only, and never the admin's own account.
/// The role check runs first; the self-delete guard is its own denial
/// kind so callers cannot conflate the two.
pub fn can_delete_user(user: &CurrentUser, target_user_id: i64) -> AppResult<()> {
    require_admin(user)?;
    if user.id == target_user_id {
        return Err(AppError::SelfDeleteBlocked);
    }
    Ok(())
}

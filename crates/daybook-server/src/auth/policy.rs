// Authorization policy
// Decision: pure functions over the acting user and the loaded row, so the
// rules are unit-testable without a running server
//
// Rule order: admin bypass first, then ownership. Activities with no owner
// are legacy rows and are accessible to any authenticated user, but only
// under the stored-token strategy; the signed strategy never creates them
// and never honors them.

use daybook_storage::{ActivityRow, NoteRow, UserRow};
use uuid::Uuid;

use super::config::AuthStrategy;
use super::middleware::AuthUser;

/// Whether `user` may read or mutate `activity`.
pub fn can_access_activity(
    user: &AuthUser,
    activity: &ActivityRow,
    strategy: AuthStrategy,
) -> bool {
    if user.is_admin {
        return true;
    }
    match activity.owner_id {
        Some(owner) => owner == user.id,
        None => strategy == AuthStrategy::Stored,
    }
}

/// Whether `user` may read or mutate `note`. No unowned exception here.
pub fn can_access_note(user: &AuthUser, note: &NoteRow) -> bool {
    user.is_admin || note.owner_id == user.id
}

/// Whether `actor` may update the user record `target_id`.
pub fn can_modify_user(actor: &AuthUser, target_id: Uuid) -> bool {
    actor.is_admin || actor.id == target_id
}

/// Whether `actor` may delete `target`. Admin accounts are never deletable,
/// not even by themselves.
pub fn can_delete_user(actor: &AuthUser, target: &UserRow) -> bool {
    actor.is_admin && !target.is_admin
}

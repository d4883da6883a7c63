//! Membership and role checks shared by the services.

use huddle_database::{Message, WorkspaceMember};

use crate::types::{WorkspaceError, WorkspaceResult};

/// Permission checking utilities
pub struct PermissionChecker;

impl PermissionChecker {
    /// Turn an optional membership lookup into a hard requirement.
    pub fn require_member(member: Option<WorkspaceMember>) -> WorkspaceResult<WorkspaceMember> {
        member.ok_or_else(WorkspaceError::unauthorized)
    }

    pub fn require_admin(member: &WorkspaceMember) -> WorkspaceResult<()> {
        if !member.is_admin() {
            return Err(WorkspaceError::unauthorized());
        }
        Ok(())
    }

    /// Only the author may edit or delete a message.
    pub fn require_author(member: &WorkspaceMember, message: &Message) -> WorkspaceResult<()> {
        if message.member_id != member.id {
            return Err(WorkspaceError::unauthorized());
        }
        Ok(())
    }

    /// Admins may remove anyone but another admin; members may only leave.
    /// Admin memberships are never removable, not even by themselves.
    pub fn can_remove_member(
        requester: &WorkspaceMember,
        target: &WorkspaceMember,
    ) -> WorkspaceResult<()> {
        if requester.workspace_id != target.workspace_id {
            return Err(WorkspaceError::unauthorized());
        }

        if target.is_admin() {
            return Err(WorkspaceError::forbidden("Admin cannot be removed"));
        }

        if requester.id != target.id && !requester.is_admin() {
            return Err(WorkspaceError::unauthorized());
        }

        Ok(())
    }
}

use super::Database;
use crate::models::{ApprovalStatus, Role, UserAccount};

/// Strip a leading `@` and lowercase, matching how the dashboard indexes handles.
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

fn username_index_key(handle: &str) -> String {
    format!("idx:username:{}", handle)
}

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

impl Database {
    /// Resolve a dashboard user record through the `idx:username` secondary index.
    pub async fn find_user_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<UserAccount>, anyhow::Error> {
        let ids = self.set_members(&username_index_key(handle)).await?;
        for id in ids {
            if let Some(user) = self.get_json::<UserAccount>(&user_key(&id)).await? {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    /// Whether the underlying account is approved, with the record itself
    /// when one exists. Fails closed: a missing record or a store error
    /// both come back as not approved.
    pub async fn is_approved(&self, handle: &str) -> (bool, Option<UserAccount>) {
        let handle = normalize_handle(handle);
        match self.find_user_by_handle(&handle).await {
            Ok(Some(user)) => (user.approval_status == ApprovalStatus::Approved, Some(user)),
            Ok(None) => (false, None),
            Err(e) => {
                warn!("Approval lookup failed for {}: {}", handle, e);
                (false, None)
            }
        }
    }

    /// The stored privilege role, degrading to `user` when the account is
    /// missing or not approved.
    pub async fn get_role(&self, handle: &str) -> Role {
        match self.is_approved(handle).await {
            (true, Some(user)) => user.role,
            _ => Role::User,
        }
    }

    /// Overwrite the role field on the user record. Callers are responsible
    /// for only promoting upward; see the connect flow's rank guard.
    pub async fn promote_role(&self, handle: &str, new_role: Role) -> Result<(), anyhow::Error> {
        let handle = normalize_handle(handle);
        let mut user = self
            .find_user_by_handle(&handle)
            .await?
            .ok_or_else(|| anyhow::anyhow!("No user record for handle {}", handle))?;
        user.role = new_role;
        self.set_json(&user_key(&user.id), &user).await?;
        info!("Promoted {} to {}", handle, new_role.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_at_sign_and_case() {
        assert_eq!(normalize_handle("@Alice"), "alice");
        assert_eq!(normalize_handle("  BOB_99 "), "bob_99");
        assert_eq!(normalize_handle("carol"), "carol");
    }

    #[test]
    fn index_key_convention() {
        assert_eq!(username_index_key("alice"), "idx:username:alice");
        assert_eq!(user_key("u1"), "user:u1");
    }
}

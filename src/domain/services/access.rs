use crate::domain::ports::GroupRepository;
use crate::error::AppError;

/// Events without a group are open to everyone; grouped events only to
/// members of that group.
pub async fn can_access(groups: &dyn GroupRepository, group_id: Option<&str>, user_id: &str) -> Result<bool, AppError> {
    match group_id {
        None => Ok(true),
        Some(group_id) => groups.has_member(group_id, user_id).await,
    }
}

pub async fn ensure_access(groups: &dyn GroupRepository, group_id: Option<&str>, user_id: &str) -> Result<(), AppError> {
    if can_access(groups, group_id, user_id).await? {
        Ok(())
    } else {
        Err(forbidden())
    }
}

pub fn forbidden() -> AppError {
    AppError::Forbidden("you do not have access to this event".into())
}

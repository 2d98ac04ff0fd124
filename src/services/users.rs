//! User lookups, cached per user id.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::caches::AppCaches;
use crate::error::ServiceError;
use crate::keys::user_key;
use crate::models::{User, UserId};
use crate::services::ResumeRepository;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn ResumeRepository>,
    caches: AppCaches,
}

impl UserService {
    pub fn new(repo: Arc<dyn ResumeRepository>, caches: AppCaches) -> Self {
        Self { repo, caches }
    }

    /// Returns the user's profile, served from cache for up to the user TTL.
    pub async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        let repo = Arc::clone(&self.repo);
        self.caches
            .users
            .compute_once(user_key(id), move || async move {
                repo.find_user(id)
                    .await?
                    .ok_or(ServiceError::NotFound { entity: "user", id })
            })
            .await
    }

    /// Changes the display name and invalidates the cached profile.
    pub async fn rename_user(
        &self,
        id: UserId,
        display_name: &str,
    ) -> Result<User, ServiceError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ServiceError::InvalidInput(
                "display name cannot be empty".to_string(),
            ));
        }

        let mut user = self
            .repo
            .find_user(id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "user", id })?;
        user.display_name = display_name.to_string();
        user.updated_at = Utc::now();
        self.repo.save_user(user.clone()).await?;

        self.caches.users.delete(&user_key(id));
        Ok(user)
    }

    /// Removes the account and everything cached about it.
    pub async fn delete_user(&self, id: UserId) -> Result<(), ServiceError> {
        let removed_resumes = self
            .repo
            .delete_user(id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "user", id })?;
        self.caches.forget_user(id, &removed_resumes);
        info!(
            user_id = id,
            resumes = removed_resumes.len(),
            "user deleted, cached lookups invalidated"
        );
        Ok(())
    }
}

use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::dto::{request::UpdateProfileRequest, response::ProfileDto},
    repositories::{ProfileUpdate, UserRepository},
};

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_profile(&self, user_id: &str) -> AppResult<ProfileDto> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", user_id)))?;

        Ok(ProfileDto::from(user))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> AppResult<ProfileDto> {
        request.validate()?;

        let update = ProfileUpdate {
            name: request.name,
            surname: request.surname,
            avatar_url: request.avatar_url,
        };
        let user = self.repository.update_profile(user_id, update).await?;
        log::info!("Updated profile for user {}", user_id);

        Ok(ProfileDto::from(user))
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, to_bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::{parse_object_id, Database},
    errors::{AppError, AppResult},
    models::domain::{user::normalize_email, User},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            set.insert("name", name);
        }
        if let Some(surname) = &self.surname {
            set.insert("surname", surname);
        }
        if let Some(avatar_url) = &self.avatar_url {
            set.insert("avatarUrl", avatar_url);
        }
        set
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> AppResult<User>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> AppResult<User>;
    /// Stores a new password hash and drops any outstanding reset token.
    async fn set_password(&self, id: &str, password_hash: &str) -> AppResult<()>;
    async fn set_reset_token(
        &self,
        id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;
    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<User>>;
    async fn increment_stats(&self, id: &str, solved: i64, points: i64) -> AppResult<()>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

fn user_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("User '{}' not found", id))
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        match self.collection.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(err) if is_duplicate_key(&err) => Err(AppError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let oid = match parse_object_id(id) {
            Ok(oid) => oid,
            Err(_) => return Ok(None),
        };
        let user = self.collection.find_one(doc! { "_id": oid }).await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "email": normalize_email(email) })
            .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> AppResult<User> {
        let oid = parse_object_id(id)?;
        let set = update.to_set_document();

        if set.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| user_not_found(id));
        }

        self.collection
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| user_not_found(id))
    }

    async fn set_password(&self, id: &str, password_hash: &str) -> AppResult<()> {
        let oid = parse_object_id(id)?;
        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! {
                    "$set": { "password": password_hash },
                    "$unset": { "resetToken": "", "resetTokenExpiry": "" },
                },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let oid = parse_object_id(id)?;
        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! {
                    "$set": {
                        "resetToken": token_hash,
                        "resetTokenExpiry": to_bson(&expires_at)?,
                    }
                },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(user_not_found(id));
        }
        Ok(())
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "resetToken": token_hash })
            .await?;
        Ok(user)
    }

    async fn increment_stats(&self, id: &str, solved: i64, points: i64) -> AppResult<()> {
        let oid = parse_object_id(id)?;
        self.collection
            .update_one(
                doc! { "_id": oid },
                doc! {
                    "$inc": {
                        "stats.solvedQuestions": solved,
                        "stats.totalPoints": points,
                    }
                },
            )
            .await?;
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();

        let reset_index = IndexModel::builder()
            .keys(doc! { "resetToken": 1 })
            .options(
                IndexOptions::builder()
                    .sparse(true)
                    .name("reset_token".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(email_index).await?;
        self.collection.create_index(reset_index).await?;
        log::info!("Created indexes on users.email and users.resetToken");

        Ok(())
    }
}

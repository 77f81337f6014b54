use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::RefreshToken};

/// Digests of issued refresh tokens. Each token is single use: rotation
/// consumes it and issues a successor.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn store(&self, token: RefreshToken) -> AppResult<()>;

    /// Atomically flips an unrevoked token to revoked and returns it as it was
    /// before the flip. Two concurrent rotations of the same token see exactly
    /// one `Some`.
    async fn consume(&self, token_hash: &str) -> AppResult<Option<RefreshToken>>;

    /// Revokes every live token of the user, returning how many were live.
    async fn revoke_for_user(&self, user_id: &str) -> AppResult<u64>;

    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoRefreshTokenRepository {
    collection: Collection<RefreshToken>,
}

impl MongoRefreshTokenRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.get_collection(collection_name),
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for MongoRefreshTokenRepository {
    async fn store(&self, token: RefreshToken) -> AppResult<()> {
        self.collection.insert_one(&token).await?;
        Ok(())
    }

    async fn consume(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        let previous = self
            .collection
            .find_one_and_update(
                doc! { "token_hash": token_hash, "revoked": false },
                doc! { "$set": { "revoked": true } },
            )
            .await?;
        Ok(previous)
    }

    async fn revoke_for_user(&self, user_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .update_many(
                doc! { "user_id": user_id, "revoked": false },
                doc! { "$set": { "revoked": true } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let by_digest = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let live_by_user = IndexModel::builder()
            .keys(doc! { "user_id": 1, "revoked": 1 })
            .build();
        self.collection
            .create_indexes([by_digest, live_by_user])
            .await?;

        log::info!("Refresh token indexes ready");
        Ok(())
    }
}

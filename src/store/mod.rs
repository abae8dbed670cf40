/// Credential store
///
/// The token lifecycle only needs lookups by id and by username/email, and
/// the two refresh-token writes. The remaining methods back the account and
/// channel endpoints.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;

pub use memory::InMemoryUserStore;
pub use models::{ChannelProfile, NewUser, PublicUser, User, VideoOwner, WatchedVideo};
pub use postgres::PostgresUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Match on either field; `None` fields are ignored
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Fails with a conflict if the username or email is taken
    async fn insert_user(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Overwrite (or clear, with `None`) the stored refresh-token digest
    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), AppError>;

    /// Compare-and-swap of the stored refresh-token digest.
    ///
    /// Returns `false` when the stored value no longer equals `expected`,
    /// which happens when a concurrent refresh or a logout won the race.
    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AppError>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError>;

    /// Returns `None` if the user no longer exists
    async fn update_account(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<User>, AppError>;

    async fn find_channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<Option<ChannelProfile>, AppError>;

    /// Most recently watched first
    async fn watch_history(&self, user_id: Uuid) -> Result<Vec<WatchedVideo>, AppError>;
}

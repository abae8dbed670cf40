use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ChannelProfile, NewUser, User, UserStore, VideoOwner, WatchedVideo};
use crate::error::{AppError, DatabaseError};

const USER_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, \
                            password_hash, refresh_token, created_at, updated_at";

/// `UserStore` backed by PostgreSQL
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct WatchedVideoRow {
    id: Uuid,
    title: String,
    description: String,
    thumbnail: String,
    video_file: String,
    duration: f64,
    views: i64,
    watched_at: DateTime<Utc>,
    owner_full_name: String,
    owner_username: String,
    owner_avatar: String,
}

impl From<WatchedVideoRow> for WatchedVideo {
    fn from(row: WatchedVideoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            thumbnail: row.thumbnail,
            video_file: row.video_file,
            duration: row.duration,
            views: row.views,
            watched_at: row.watched_at,
            owner: VideoOwner {
                full_name: row.owner_full_name,
                username: row.owner_username,
                avatar: row.owner_avatar,
            },
        }
    }
}

/// Re-label unique violations with a message meant for the client
fn map_conflict(err: sqlx::Error, message: &str) -> AppError {
    match AppError::from(err) {
        AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
            AppError::conflict(message)
        }
        other => other,
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        // NULL never compares equal, so an absent field matches nothing
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $2 LIMIT 1",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (id, username, email, full_name, avatar, cover_image, password_hash,
                 refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.avatar)
        .bind(&new_user.cover_image)
        .bind(&new_user.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_conflict(e, "User with email or username already exists"))?;

        Ok(user)
    }

    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = $3 WHERE id = $1")
            .bind(user_id)
            .bind(token_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $3, updated_at = $4
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(user_id)
        .bind(expected)
        .bind(replacement)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_account(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET full_name = $2, email = $3, updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(full_name)
        .bind(email)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_conflict(e, "Email is already in use"))?;

        Ok(user)
    }

    async fn find_channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<Option<ChannelProfile>, AppError> {
        let profile = sqlx::query_as::<_, ChannelProfile>(
            r#"
            SELECT
                u.id, u.username, u.full_name, u.email, u.avatar, u.cover_image,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                    AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                    AS channels_subscribed_to_count,
                EXISTS (
                    SELECT 1 FROM subscriptions s
                    WHERE s.channel_id = u.id AND s.subscriber_id = $2
                ) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn watch_history(&self, user_id: Uuid) -> Result<Vec<WatchedVideo>, AppError> {
        let rows = sqlx::query_as::<_, WatchedVideoRow>(
            r#"
            SELECT
                v.id, v.title, v.description, v.thumbnail, v.video_file, v.duration, v.views,
                w.watched_at,
                o.full_name AS owner_full_name,
                o.username AS owner_username,
                o.avatar AS owner_avatar
            FROM watch_history w
            JOIN videos v ON v.id = w.video_id
            JOIN users o ON o.id = v.owner_id
            WHERE w.user_id = $1
            ORDER BY w.watched_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WatchedVideo::from).collect())
    }
}

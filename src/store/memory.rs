use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChannelProfile, NewUser, User, UserStore, VideoOwner, WatchedVideo};
use crate::error::AppError;

#[derive(Debug, Clone)]
struct Video {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    thumbnail: String,
    video_file: String,
    duration: f64,
    views: i64,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    videos: HashMap<Uuid, Video>,
    /// (subscriber, channel)
    subscriptions: Vec<(Uuid, Uuid)>,
    /// (user, video, watched_at), in insertion order
    history: Vec<(Uuid, Uuid, DateTime<Utc>)>,
}

impl Inner {
    fn username_or_email_taken(&self, username: &str, email: &str, except: Option<Uuid>) -> bool {
        self.users.values().any(|u| {
            Some(u.id) != except && (u.username == username || u.email == email)
        })
    }
}

/// In-process `UserStore` for local development and tests.
///
/// Writes are serialized by a single lock, which gives the same
/// per-record guarantees the database provides.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a video owned by `owner_id`
    pub async fn add_video(&self, owner_id: Uuid, title: &str, duration: f64) -> Uuid {
        let id = Uuid::new_v4();
        let video = Video {
            id,
            owner_id,
            title: title.to_string(),
            description: String::new(),
            thumbnail: format!("https://cdn.videotube.local/thumbs/{}.png", id),
            video_file: format!("https://cdn.videotube.local/videos/{}.mp4", id),
            duration,
            views: 0,
        };
        self.inner.write().await.videos.insert(id, video);
        id
    }

    pub async fn subscribe(&self, subscriber_id: Uuid, channel_id: Uuid) {
        let mut inner = self.inner.write().await;
        if !inner.subscriptions.contains(&(subscriber_id, channel_id)) {
            inner.subscriptions.push((subscriber_id, channel_id));
        }
    }

    pub async fn record_watch(&self, user_id: Uuid, video_id: Uuid) {
        let mut inner = self.inner.write().await;
        if let Some(video) = inner.videos.get_mut(&video_id) {
            video.views += 1;
        }
        inner.history.push((user_id, video_id, Utc::now()));
    }

    /// Delete a user along with its videos, subscriptions and history
    pub async fn remove_user(&self, user_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.users.remove(&user_id);
        inner.videos.retain(|_, v| v.owner_id != user_id);
        inner
            .subscriptions
            .retain(|(subscriber, channel)| *subscriber != user_id && *channel != user_id);
        let videos = &inner.videos;
        let remaining: Vec<_> = inner
            .history
            .iter()
            .filter(|(user, video, _)| *user != user_id && videos.contains_key(video))
            .cloned()
            .collect();
        inner.history = remaining;
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        let user = inner
            .users
            .values()
            .find(|u| {
                username.map_or(false, |name| u.username == name)
                    || email.map_or(false, |mail| u.email == mail)
            })
            .cloned();
        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(&user_id).cloned())
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        if inner.username_or_email_taken(&new_user.username, &new_user.email, None) {
            return Err(AppError::conflict("User with email or username already exists"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            full_name: new_user.full_name,
            avatar: new_user.avatar,
            cover_image: new_user.cover_image,
            password_hash: new_user.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), AppError> {
        if let Some(user) = self.inner.write().await.users.get_mut(&user_id) {
            user.refresh_token = token_hash.map(str::to_string);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&user_id) {
            Some(user) if user.refresh_token.as_deref() == Some(expected) => {
                user.refresh_token = Some(replacement.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        if let Some(user) = self.inner.write().await.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_account(
        &self,
        user_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let mut inner = self.inner.write().await;
        let email_taken = inner
            .users
            .values()
            .any(|u| u.id != user_id && u.email == email);
        if email_taken {
            return Err(AppError::conflict("Email is already in use"));
        }

        let updated = inner.users.get_mut(&user_id).map(|user| {
            user.full_name = full_name.to_string();
            user.email = email.to_string();
            user.updated_at = Utc::now();
            user.clone()
        });
        Ok(updated)
    }

    async fn find_channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<Option<ChannelProfile>, AppError> {
        let inner = self.inner.read().await;
        let channel = match inner.users.values().find(|u| u.username == username) {
            Some(channel) => channel,
            None => return Ok(None),
        };

        let subscribers_count = inner
            .subscriptions
            .iter()
            .filter(|(_, ch)| *ch == channel.id)
            .count() as i64;
        let channels_subscribed_to_count = inner
            .subscriptions
            .iter()
            .filter(|(sub, _)| *sub == channel.id)
            .count() as i64;
        let is_subscribed = inner.subscriptions.contains(&(viewer_id, channel.id));

        Ok(Some(ChannelProfile {
            id: channel.id,
            username: channel.username.clone(),
            full_name: channel.full_name.clone(),
            email: channel.email.clone(),
            avatar: channel.avatar.clone(),
            cover_image: channel.cover_image.clone(),
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        }))
    }

    async fn watch_history(&self, user_id: Uuid) -> Result<Vec<WatchedVideo>, AppError> {
        let inner = self.inner.read().await;
        let history = inner
            .history
            .iter()
            .rev()
            .filter(|(user, _, _)| *user == user_id)
            .filter_map(|(_, video_id, watched_at)| {
                let video = inner.videos.get(video_id)?;
                let owner = inner.users.get(&video.owner_id)?;
                Some(WatchedVideo {
                    id: video.id,
                    title: video.title.clone(),
                    description: video.description.clone(),
                    thumbnail: video.thumbnail.clone(),
                    video_file: video.video_file.clone(),
                    duration: video.duration,
                    views: video.views,
                    watched_at: *watched_at,
                    owner: VideoOwner {
                        full_name: owner.full_name.clone(),
                        username: owner.username.clone(),
                        avatar: owner.avatar.clone(),
                    },
                })
            })
            .collect();
        Ok(history)
    }
}

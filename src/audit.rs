/// Audit trail for security-relevant account events
///
/// Login attempts, token refreshes, refresh-token reuse and logouts are
/// recorded as structured `tracing` events so they can be filtered out of
/// the JSON log stream by `target = "audit"`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Failure => "FAILURE",
        }
    }
}

/// Audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub log_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// REGISTER, LOGIN, REFRESH_TOKEN, LOGOUT, CHANGE_PASSWORD, ...
    pub action: &'static str,
    pub status: AuditStatus,
    pub user_id: Option<Uuid>,
    pub request_id: Option<String>,
    pub message: String,
}

impl AuditLog {
    pub fn new(action: &'static str, status: AuditStatus, message: impl Into<String>) -> Self {
        Self {
            log_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            status,
            user_id: None,
            request_id: None,
            message: message.into(),
        }
    }

    pub fn success(action: &'static str, message: impl Into<String>) -> Self {
        Self::new(action, AuditStatus::Success, message)
    }

    pub fn failure(action: &'static str, message: impl Into<String>) -> Self {
        Self::new(action, AuditStatus::Failure, message)
    }

    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }

    pub fn record(&self) {
        match self.status {
            AuditStatus::Failure => tracing::warn!(
                target: "audit",
                log_id = %self.log_id,
                action = self.action,
                status = self.status.as_str(),
                user_id = ?self.user_id,
                request_id = ?self.request_id,
                detail = %self.message,
                "Audit log entry"
            ),
            AuditStatus::Success => tracing::info!(
                target: "audit",
                log_id = %self.log_id,
                action = self.action,
                status = self.status.as_str(),
                user_id = ?self.user_id,
                request_id = ?self.request_id,
                detail = %self.message,
                "Audit log entry"
            ),
        }
    }
}

//! Request/response and error types shared by calendar providers.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Private extended-property key tagging app-created events.
pub const APP_ID_PROPERTY: &str = "app_id";
/// Value stored under [`APP_ID_PROPERTY`].
pub const APP_ID: &str = "executeos-app";

pub type ProviderResult<T> = Result<T, SyncError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Auth,
    CreateEvent,
    UpdateEvent,
    ListTaskLists,
    CreateTask,
}

impl SyncStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::CreateEvent => "create_event",
            Self::UpdateEvent => "update_event",
            Self::ListTaskLists => "list_task_lists",
            Self::CreateTask => "create_task",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderHealth {
    Healthy,
    Degraded,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderAuthState {
    Unauthenticated,
    Authenticated,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider_id: String,
    pub health: ProviderHealth,
    pub auth_state: ProviderAuthState,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl ProviderStatus {
    /// Whether remote writes should be attempted.
    pub fn is_connected(&self) -> bool {
        self.auth_state == ProviderAuthState::Authenticated
            && self.health != ProviderHealth::Unavailable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAuthRequest {
    pub interactive: bool,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAuthResult {
    pub state: ProviderAuthState,
    pub granted: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Event body sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEventDraft {
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub private_properties: BTreeMap<String, String>,
}

impl RemoteEventDraft {
    /// Draft tagged with the app id.
    pub fn tagged(
        summary: impl Into<String>,
        description: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        let mut private_properties = BTreeMap::new();
        private_properties.insert(APP_ID_PROPERTY.to_string(), APP_ID.to_string());
        Self {
            summary: summary.into(),
            description,
            start,
            end,
            private_properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEventRef {
    pub calendar_id: String,
    pub event_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTaskRef {
    pub task_list_id: String,
    pub task_id: String,
}

/// Provider failure envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    pub provider_id: String,
    pub stage: SyncStage,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl SyncError {
    pub fn new(
        provider_id: impl Into<String>,
        stage: SyncStage,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            stage,
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}] {}: {}",
            self.provider_id,
            self.stage.as_str(),
            self.code,
            self.message
        )
    }
}

impl Error for SyncError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_draft_carries_app_id() {
        let now = Utc::now();
        let draft = RemoteEventDraft::tagged("Focus", None, now, now);
        assert_eq!(
            draft.private_properties.get("app_id").map(String::as_str),
            Some("executeos-app")
        );
    }

    #[test]
    fn status_needs_authentication_to_connect() {
        let mut status = ProviderStatus {
            provider_id: "google_calendar".to_string(),
            health: ProviderHealth::Healthy,
            auth_state: ProviderAuthState::Expired,
            last_sync_at: None,
        };
        assert!(!status.is_connected());
        status.auth_state = ProviderAuthState::Authenticated;
        assert!(status.is_connected());
    }
}

//! Calendar/tasks provider interface.

use crate::sync::provider_types::{
    ProviderAuthRequest, ProviderAuthResult, ProviderResult, ProviderStatus, RemoteEventDraft,
    RemoteEventRef, RemoteTaskRef, TaskDraft, TaskList,
};

/// One remote calendar backend (e.g. Google Calendar + Tasks).
///
/// Implementations own their transport and tokens; callers only see drafts
/// and refs.
pub trait CalendarProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    fn status(&self) -> ProviderStatus;

    fn authorize(&self, request: ProviderAuthRequest) -> ProviderResult<ProviderAuthResult>;

    fn create_event(
        &self,
        calendar_id: &str,
        draft: &RemoteEventDraft,
    ) -> ProviderResult<RemoteEventRef>;

    fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        draft: &RemoteEventDraft,
    ) -> ProviderResult<()>;

    fn list_task_lists(&self) -> ProviderResult<Vec<TaskList>>;

    fn create_task(&self, task_list_id: &str, draft: &TaskDraft) -> ProviderResult<RemoteTaskRef>;
}

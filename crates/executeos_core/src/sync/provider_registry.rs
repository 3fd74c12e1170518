//! In-process calendar provider registry and selection.

use crate::sync::provider_spi::CalendarProvider;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Provider registration/selection errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRegistryError {
    InvalidProviderId(String),
    DuplicateProviderId(String),
    ProviderNotFound(String),
}

impl Display for ProviderRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProviderId(value) => write!(f, "provider id is invalid: {value}"),
            Self::DuplicateProviderId(value) => {
                write!(f, "provider id already registered: {value}")
            }
            Self::ProviderNotFound(value) => write!(f, "provider not found: {value}"),
        }
    }
}

impl Error for ProviderRegistryError {}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn CalendarProvider>>,
    active_provider_id: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one provider adapter.
    pub fn register(
        &mut self,
        provider: Arc<dyn CalendarProvider>,
    ) -> Result<(), ProviderRegistryError> {
        let provider_id = provider.provider_id().trim().to_string();
        if !is_valid_provider_id(&provider_id) {
            return Err(ProviderRegistryError::InvalidProviderId(provider_id));
        }
        if self.providers.contains_key(provider_id.as_str()) {
            return Err(ProviderRegistryError::DuplicateProviderId(provider_id));
        }

        self.providers.insert(provider_id, provider);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn select_active(&mut self, provider_id: &str) -> Result<(), ProviderRegistryError> {
        let normalized = provider_id.trim();
        if !self.providers.contains_key(normalized) {
            return Err(ProviderRegistryError::ProviderNotFound(
                normalized.to_string(),
            ));
        }
        self.active_provider_id = Some(normalized.to_string());
        Ok(())
    }

    pub fn clear_active(&mut self) {
        self.active_provider_id = None;
    }

    pub fn active_provider_id(&self) -> Option<&str> {
        self.active_provider_id.as_deref()
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn CalendarProvider>> {
        self.providers.get(provider_id.trim()).cloned()
    }

    pub fn active_provider(&self) -> Option<Arc<dyn CalendarProvider>> {
        let id = self.active_provider_id()?;
        self.get(id)
    }

    /// Active provider when it is authenticated and reachable; `None` means
    /// the workflow runs in local mode.
    pub fn connected_provider(&self) -> Option<Arc<dyn CalendarProvider>> {
        self.active_provider()
            .filter(|provider| provider.status().is_connected())
    }
}

fn is_valid_provider_id(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::{ProviderRegistry, ProviderRegistryError};
    use crate::sync::provider_spi::CalendarProvider;
    use crate::sync::provider_types::{
        ProviderAuthRequest, ProviderAuthResult, ProviderAuthState, ProviderHealth,
        ProviderResult, ProviderStatus, RemoteEventDraft, RemoteEventRef, RemoteTaskRef,
        TaskDraft, TaskList,
    };
    use std::sync::Arc;

    struct MockProvider {
        provider_id: String,
        auth_state: ProviderAuthState,
    }

    impl MockProvider {
        fn new(provider_id: &str) -> Self {
            Self {
                provider_id: provider_id.to_string(),
                auth_state: ProviderAuthState::Authenticated,
            }
        }

        fn signed_out(provider_id: &str) -> Self {
            Self {
                auth_state: ProviderAuthState::Unauthenticated,
                ..Self::new(provider_id)
            }
        }
    }

    impl CalendarProvider for MockProvider {
        fn provider_id(&self) -> &str {
            &self.provider_id
        }

        fn status(&self) -> ProviderStatus {
            ProviderStatus {
                provider_id: self.provider_id.clone(),
                health: ProviderHealth::Healthy,
                auth_state: self.auth_state,
                last_sync_at: None,
            }
        }

        fn authorize(&self, _request: ProviderAuthRequest) -> ProviderResult<ProviderAuthResult> {
            Ok(ProviderAuthResult {
                state: ProviderAuthState::Authenticated,
                granted: true,
                expires_at: None,
            })
        }

        fn create_event(
            &self,
            calendar_id: &str,
            _draft: &RemoteEventDraft,
        ) -> ProviderResult<RemoteEventRef> {
            Ok(RemoteEventRef {
                calendar_id: calendar_id.to_string(),
                event_id: "evt-1".to_string(),
            })
        }

        fn update_event(
            &self,
            _calendar_id: &str,
            _event_id: &str,
            _draft: &RemoteEventDraft,
        ) -> ProviderResult<()> {
            Ok(())
        }

        fn list_task_lists(&self) -> ProviderResult<Vec<TaskList>> {
            Ok(vec![TaskList {
                id: "list-1".to_string(),
                title: "My Tasks".to_string(),
            }])
        }

        fn create_task(
            &self,
            task_list_id: &str,
            _draft: &TaskDraft,
        ) -> ProviderResult<RemoteTaskRef> {
            Ok(RemoteTaskRef {
                task_list_id: task_list_id.to_string(),
                task_id: "task-1".to_string(),
            })
        }
    }

    #[test]
    fn registers_and_selects_provider() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(MockProvider::new("google_calendar")))
            .expect("provider should register");
        assert_eq!(registry.len(), 1);
        assert!(registry.active_provider_id().is_none());

        registry
            .select_active("  google_calendar  ")
            .expect("trimmed provider id should be selectable");
        assert_eq!(registry.active_provider_id(), Some("google_calendar"));
    }

    #[test]
    fn rejects_invalid_or_duplicate_provider_id() {
        let mut registry = ProviderRegistry::new();
        let invalid = registry.register(Arc::new(MockProvider::new("Google Calendar")));
        assert!(matches!(
            invalid,
            Err(ProviderRegistryError::InvalidProviderId(_))
        ));
        let blank = registry.register(Arc::new(MockProvider::new("   ")));
        assert!(matches!(
            blank,
            Err(ProviderRegistryError::InvalidProviderId(_))
        ));

        registry
            .register(Arc::new(MockProvider::new("google_calendar")))
            .expect("first provider should register");
        let duplicate = registry.register(Arc::new(MockProvider::new("google_calendar")));
        assert!(matches!(
            duplicate,
            Err(ProviderRegistryError::DuplicateProviderId(_))
        ));
    }

    #[test]
    fn connected_provider_follows_selection() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(MockProvider::new("google_calendar")))
            .expect("provider should register");
        assert!(registry.connected_provider().is_none());

        registry
            .select_active("google_calendar")
            .expect("provider should select");
        let provider = registry.connected_provider().expect("connected");
        assert_eq!(provider.provider_id(), "google_calendar");

        registry.clear_active();
        assert!(registry.active_provider().is_none());
        assert!(registry.connected_provider().is_none());
    }

    #[test]
    fn connected_provider_requires_authentication() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(MockProvider::signed_out("google_calendar")))
            .expect("provider should register");
        registry
            .select_active("google_calendar")
            .expect("provider should select");
        assert!(registry.active_provider().is_some());
        assert!(registry.connected_provider().is_none());
    }
}

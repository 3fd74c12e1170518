//! Write-only calendar/tasks sync contract.
//!
//! # Responsibility
//! - Define the provider SPI the workflow calls when placing blocks.
//! - Keep provider selection in one in-process registry.
//!
//! # Invariants
//! - Events created here carry the private `app_id` property.
//! - No pull or reconciliation: remote state is written, never read back.

pub mod provider_registry;
pub mod provider_spi;
pub mod provider_types;

pub use provider_registry::{ProviderRegistry, ProviderRegistryError};
pub use provider_spi::CalendarProvider;
pub use provider_types::{
    ProviderAuthState, ProviderHealth, ProviderResult, ProviderStatus, RemoteEventDraft,
    RemoteEventRef, RemoteTaskRef, SyncError, SyncStage, TaskDraft, TaskList, APP_ID,
    APP_ID_PROPERTY,
};

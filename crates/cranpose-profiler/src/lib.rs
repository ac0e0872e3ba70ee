//! Render ledger, derived views and render events for profiling Cranpose
//! components in tests.

mod bundle;
pub mod cache;
pub(crate) mod collections;
pub mod component;
pub mod config;
mod error;
pub mod events;
pub mod ledger;
pub mod phase;
pub mod registry;
pub mod stabilization;
pub mod wait;

pub use bundle::ProfileBundle;
pub use cache::{CacheProvider, CacheStats, RecordView, UncachedViews, ViewCache, ViewKey};
pub use component::{with_profiler, ProfiledComponent, RenderQuery};
pub use config::{ProfilerConfig, StabilizationOptions, WaitOptions};
pub use error::ProfilerError;
pub use events::{
    EventHub, EventProvider, ListenerId, RenderEvent, RenderListener, RenderSubscription,
};
pub use ledger::RenderLedger;
pub use phase::{format_phases, CommitInfo, RenderPhase, RenderRecord};
pub use registry::{ComponentRegistry, Providers, RegistryGuard};
pub use stabilization::{Stabilization, StabilizationResult};
pub use wait::{ConditionWait, NextRender, Progress, WaitOutcome};

pub mod prelude {
    pub use crate::component::{with_profiler, ProfiledComponent, RenderQuery};
    pub use crate::config::{StabilizationOptions, WaitOptions};
    pub use crate::phase::{CommitInfo, RenderPhase};
    pub use crate::registry::ComponentRegistry;
    pub use crate::ProfilerError;
}

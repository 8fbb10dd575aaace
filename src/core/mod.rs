// ============================================================================
// galactic-state - Core Module
// Fundamental types, errors, flags and the thread-local render context
// ============================================================================

pub mod constants;
pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use context::{is_rendering, with_context, RenderContext};
pub use error::{Result, StateError};
pub use types::{
    CleanupFn, ComponentId, SubscriberFn, SubscriptionId, Update, UpdaterFn, ValidatorFn,
};

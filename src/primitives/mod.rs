// ============================================================================
// galactic-state - Primitives Module
// Observer, component, hook and the shared-state factory
// ============================================================================

pub mod component;
pub mod hook;
pub mod observer;
pub mod shared;

// Re-export for convenience
pub use component::{current_component, Component};
pub use hook::{use_shared, HookPair, Setter};
pub use observer::{Observer, Subscription};
pub use shared::{
    create_shared_state, create_shared_state_with, BuildMode, SharedState, SharedStateBuilder,
    SharedStateOptions,
};

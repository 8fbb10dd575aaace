// ============================================================================
// galactic-state - Errors
// ============================================================================

use thiserror::Error;

use super::types::ComponentId;

/// Errors raised by the shared-state factory and the hook adapter.
///
/// Observer operations themselves (subscribe, unsubscribe, update) cannot
/// fail and do not appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The configured validator rejected the initial value.
    #[error("invalid initial value: {reason}")]
    InvalidInitialValue { reason: String },

    /// A hook was invoked while no component was rendering.
    #[error("hooks can only be used while a component is rendering")]
    OutsideRender,

    /// Render was requested on a component that has already unmounted.
    #[error("{id} is unmounted")]
    Unmounted { id: ComponentId },

    /// Render was requested on a component that is already rendering, e.g.
    /// by a scheduler that renders synchronously. The component stays dirty.
    #[error("{id} is already rendering")]
    AlreadyRendering { id: ComponentId },

    /// The hook stored at this slot has a different type than the one
    /// requesting it, i.e. hooks were called in a different order.
    #[error("hook slot {index} was created by a different hook; hooks must run in the same order on every render")]
    HookOrderMismatch { index: usize },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StateError>;

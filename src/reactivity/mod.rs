// ============================================================================
// galactic-state - Reactivity Module
// Re-render scheduling between shared cells and the host
// ============================================================================

pub mod scheduling;

pub use scheduling::{RenderQueue, Scheduler};

// ============================================================================
// galactic-state - Constants
// Component status flags
// ============================================================================

// =============================================================================
// COMPONENT STATUS FLAGS
// =============================================================================

/// Component is mounted and may render
pub const MOUNTED: u32 = 1 << 0;

/// Component has pending state and should re-render
pub const DIRTY: u32 = 1 << 1;

/// Component is currently inside `render()`
pub const RENDERING: u32 = 1 << 2;

/// Component has been torn down
pub const UNMOUNTED: u32 = 1 << 3;

/// Mask of lifecycle bits (mounted/unmounted)
pub const LIFECYCLE_MASK: u32 = MOUNTED | UNMOUNTED;

//! Overlay compositing and the interactive placement session that drives it.

/// Premultiplied per-pixel blend functions.
pub mod blend;
/// Colour correction applied to overlays before blending.
pub mod filter;
/// Move/resize/rotate gesture state machine.
pub mod gesture;
/// Undo/redo log of committed transforms.
pub mod history;
/// Display-to-native mapping and the compositor itself.
pub mod overlay;

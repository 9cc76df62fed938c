//! Configuration composition
//!
//! A descriptor is composed from:
//! 1. The base descriptor (entries, output naming, resolver, base rules)
//! 2. The mode overlay from the active profile
//! 3. Optional overlay files, in order

mod base;
mod effective;
mod merge;
mod overlay;

pub use base::{
    resolve_root, standard_rules, BaseDescriptorBuilder, BaseOptions, DEFAULT_INLINE_THRESHOLD,
};
pub use effective::{EffectiveConfig, OverlayOrigin, OverlaySource, SCHEMA_ID, SCHEMA_VERSION};
pub use merge::{compose, merge, merge_output, merge_rules};
pub use overlay::{Overlay, OverlayError};

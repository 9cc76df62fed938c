//! Composition errors.

use bundle_rules::RuleError;
use std::io;
use std::path::PathBuf;

use crate::config::OverlayError;
use crate::plugin::PluginError;

/// Errors raised while composing a descriptor.
///
/// All of them surface before any transform work begins and none are
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Cannot resolve project root {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),

    #[error("Invalid overlay: {0}")]
    Overlay(#[from] OverlayError),

    #[error("Plugin failed: {0}")]
    Plugin(#[from] PluginError),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

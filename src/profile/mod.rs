//! Environment profiles
//!
//! Each mode produces the overlay composed onto the base descriptor:
//! - Production (`build`): extraction, minification, fail-fast
//! - Development (`serve`): hot replacement, dev server, best-effort

mod development;
mod production;

use bundle_rules::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{merge, BaseOptions, Overlay};
use crate::descriptor::ConfigDescriptor;

pub use development::development_overlay;
pub use production::production_overlay;

/// Name of the compile-time global carrying the development flag.
pub const DEV_FLAG: &str = "__isDev__";

/// Operating mode of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Production,
    Development,
}

impl Mode {
    /// The overlay fragment for this mode.
    pub fn overlay(&self, options: &BaseOptions) -> Result<Overlay, RuleError> {
        match self {
            Mode::Production => production_overlay(options),
            Mode::Development => development_overlay(options),
        }
    }

    /// Compose this mode's overlay onto `base`.
    pub fn compose(
        &self,
        base: &ConfigDescriptor,
        options: &BaseOptions,
    ) -> Result<ConfigDescriptor, RuleError> {
        Ok(merge(base, &self.overlay(options)?))
    }

    /// CLI command running this mode.
    pub fn command(&self) -> &'static str {
        match self {
            Mode::Production => "build",
            Mode::Development => "serve",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Mode::Development)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Production => write!(f, "production"),
            Mode::Development => write!(f, "development"),
        }
    }
}

//! bundle-config - bundler configuration composition
//!
//! Builds the configuration handed to an external bundling engine for two
//! modes: a production bundle (`build`) and a live development server
//! (`serve`). A shared base descriptor is composed with a mode overlay;
//! the resulting [`ConfigDescriptor`] carries the asset-routing rule table
//! and the output policy that decides how assets are named and inlined.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod output;
pub mod plugin;
pub mod policy;
pub mod profile;
pub mod route;
pub mod signal;

pub use bundle_rules::{AssetCategory, Loader, Lookup, Rule, RuleError, RuleTable, Transform};
pub use config::{merge, BaseDescriptorBuilder, BaseOptions, EffectiveConfig, Overlay};
pub use descriptor::{ConfigDescriptor, DevServer, Output, Target};
pub use error::ComposeError;
pub use output::{Asset, OutputResolver, Resolution};
pub use plugin::{Plugin, PluginEffect};
pub use policy::{BuildLedger, FailurePolicy};
pub use profile::Mode;
pub use route::{AssetRouter, RouteDecision};

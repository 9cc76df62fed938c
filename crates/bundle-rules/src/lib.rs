//! Ordered asset-routing rules for bundler configurations.
//!
//! A [`RuleTable`] maps a candidate file path to the [`Rule`] whose transform
//! chain must process it. Rules are evaluated in table order and the last
//! match wins, so a rule appended by an overlay supersedes earlier ones.

mod error;
mod pattern;
mod rule;
mod table;

pub use error::RuleError;
pub use pattern::{PathFilter, TestPattern};
pub use rule::{AssetCategory, Loader, Rule, RuleSpec, Transform};
pub use table::{Lookup, RuleTable};

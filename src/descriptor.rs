//! The composed configuration handed to the bundling engine.

use bundle_rules::RuleTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::plugin::Plugin;
use crate::profile::DEV_FLAG;

/// Platform the bundle is built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Web,
}

/// Output naming and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    /// Directory receiving emitted files
    pub path: PathBuf,

    /// Script bundle naming pattern (`[name]` is the bundle name)
    pub filename: String,

    /// URL prefix for emitted files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,

    /// Naming pattern for emitted static assets
    pub asset_filename: String,
}

/// Partial output options supplied by an overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct OutputOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_filename: Option<String>,
}

/// Development server options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DevServer {
    pub public_path: String,
    pub compress: bool,
    pub tls: bool,
    pub port: u16,
    #[serde(default)]
    pub stats_colors: bool,
}

/// Build statistics reporting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stats {
    pub colors: bool,
}

impl Default for Stats {
    fn default() -> Self {
        Self { colors: true }
    }
}

/// The final build configuration.
///
/// Built once per invocation by [`crate::config::BaseDescriptorBuilder`] and
/// [`crate::config::merge`], then only read. Fields are exposed through
/// accessors so nothing outside the composition step can change them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDescriptor {
    pub(crate) context: PathBuf,
    pub(crate) entries: BTreeMap<String, String>,
    pub(crate) rules: RuleTable,
    pub(crate) output: Output,
    pub(crate) plugins: Vec<Plugin>,
    pub(crate) resolve_extensions: Vec<String>,
    pub(crate) target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) dev_server: Option<DevServer>,
    pub(crate) bail: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) devtool: Option<String>,
    pub(crate) stats: Stats,
}

impl ConfigDescriptor {
    pub fn context(&self) -> &Path {
        &self.context
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn resolve_extensions(&self) -> &[String] {
        &self.resolve_extensions
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn dev_server(&self) -> Option<&DevServer> {
        self.dev_server.as_ref()
    }

    /// Whether the first transform error aborts the whole run.
    pub fn bail(&self) -> bool {
        self.bail
    }

    pub fn devtool(&self) -> Option<&str> {
        self.devtool.as_deref()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Look up a compile-time global set by a define plugin.
    ///
    /// Later plugins win when several define the same name.
    pub fn definition(&self, name: &str) -> Option<&Value> {
        self.plugins.iter().rev().find_map(|plugin| match plugin {
            Plugin::Define { definitions } => definitions.get(name),
            _ => None,
        })
    }

    /// Value of the global development flag (false when never defined).
    pub fn is_development(&self) -> bool {
        self.definition(DEV_FLAG)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

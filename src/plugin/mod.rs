//! Build plugins
//!
//! The plugin set is closed: every variant the profiles can register is
//! listed here and applied through [`Plugin::apply`]. Only [`Plugin::Clean`]
//! touches the filesystem; the others describe the artifact or engine
//! feature they contribute.

mod clean;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::descriptor::ConfigDescriptor;

pub use clean::{clean_paths, CleanReport};

/// Report generation mode for the bundle analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerMode {
    /// Write a standalone HTML report next to the bundle
    Static,
    /// Print the report to the build log only
    Disabled,
}

/// Markup minification options for the HTML entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlMinify {
    pub remove_comments: bool,
    pub collapse_whitespace: bool,
    pub remove_redundant_attributes: bool,
    pub use_short_doctype: bool,
    pub remove_empty_attributes: bool,
    pub remove_style_link_type_attributes: bool,
    pub keep_closing_slash: bool,
    pub minify_js: bool,
    pub minify_css: bool,
    pub minify_urls: bool,
}

impl HtmlMinify {
    /// Every minification switch on.
    pub fn aggressive() -> Self {
        Self {
            remove_comments: true,
            collapse_whitespace: true,
            remove_redundant_attributes: true,
            use_short_doctype: true,
            remove_empty_attributes: true,
            remove_style_link_type_attributes: true,
            keep_closing_slash: true,
            minify_js: true,
            minify_css: true,
            minify_urls: true,
        }
    }
}

/// A registered plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plugin", rename_all = "kebab-case")]
pub enum Plugin {
    /// Compile-time global constants
    Define { definitions: BTreeMap<String, Value> },

    /// Hoist modules into a single scope (cross-module deduplication)
    ModuleConcatenation,

    /// Bundle composition report
    #[serde(rename_all = "camelCase")]
    BundleAnalyzer {
        analyzer_mode: AnalyzerMode,
        log_level: String,
        report_filename: String,
    },

    /// Remove previous contents of the given directories, relative to the root
    Clean { paths: Vec<String> },

    /// Collect extracted stylesheets into one file
    ExtractText { filename: String },

    /// Generate the HTML entry point
    Html {
        inject: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minify: Option<HtmlMinify>,
    },

    /// Whole-tree script minifier
    Minify,

    /// Live module replacement for the dev server
    HotModuleReplacement,
}

/// What applying a plugin produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum PluginEffect {
    Defined { names: Vec<String> },
    Enabled { feature: &'static str },
    Emits { artifact: PathBuf },
    Cleaned(CleanReport),
}

/// Plugin application errors.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Refusing to clean {0}: outside the project root")]
    OutsideRoot(String),
}

impl Plugin {
    pub fn name(&self) -> &'static str {
        match self {
            Plugin::Define { .. } => "define",
            Plugin::ModuleConcatenation => "module-concatenation",
            Plugin::BundleAnalyzer { .. } => "bundle-analyzer",
            Plugin::Clean { .. } => "clean",
            Plugin::ExtractText { .. } => "extract-text",
            Plugin::Html { .. } => "html",
            Plugin::Minify => "minify",
            Plugin::HotModuleReplacement => "hot-module-replacement",
        }
    }

    /// Apply the plugin to a composed descriptor.
    pub fn apply(&self, descriptor: &ConfigDescriptor) -> Result<PluginEffect, PluginError> {
        let output_dir = &descriptor.output().path;

        let effect = match self {
            Plugin::Define { definitions } => PluginEffect::Defined {
                names: definitions.keys().cloned().collect(),
            },
            Plugin::ModuleConcatenation => PluginEffect::Enabled {
                feature: "module-concatenation",
            },
            Plugin::BundleAnalyzer {
                analyzer_mode,
                report_filename,
                ..
            } => match analyzer_mode {
                AnalyzerMode::Static => PluginEffect::Emits {
                    artifact: output_dir.join(report_filename),
                },
                AnalyzerMode::Disabled => PluginEffect::Enabled {
                    feature: "bundle-analyzer",
                },
            },
            Plugin::Clean { paths } => {
                PluginEffect::Cleaned(clean_paths(descriptor.context(), paths)?)
            }
            Plugin::ExtractText { filename } => PluginEffect::Emits {
                artifact: output_dir.join(filename),
            },
            Plugin::Html { .. } => PluginEffect::Emits {
                artifact: output_dir.join("index.html"),
            },
            Plugin::Minify => PluginEffect::Enabled { feature: "minify" },
            Plugin::HotModuleReplacement => PluginEffect::Enabled {
                feature: "hot-module-replacement",
            },
        };

        debug!(plugin = self.name(), ?effect, "applied plugin");
        Ok(effect)
    }
}

/// Apply every plugin in registration order, stopping at the first error.
pub fn apply_plugins(descriptor: &ConfigDescriptor) -> Result<Vec<PluginEffect>, PluginError> {
    let effects = descriptor
        .plugins()
        .iter()
        .map(|plugin| plugin.apply(descriptor))
        .collect::<Result<Vec<_>, _>>()?;

    info!(count = effects.len(), "plugins applied");
    Ok(effects)
}

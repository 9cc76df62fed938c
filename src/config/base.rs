//! Base descriptor: the environment-independent configuration.
//!
//! Holds the fixed built-in options and the standard rule table for
//! scripts, fonts and images. Stylesheet rules are left to the profiles.

use bundle_rules::{AssetCategory, Loader, PathFilter, Rule, RuleError, RuleTable, Transform};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::descriptor::{ConfigDescriptor, Output, Stats, Target};

/// Default inline threshold for fonts and images, in bytes.
pub const DEFAULT_INLINE_THRESHOLD: u64 = 10_000;

/// Optional `?v=x.y.z` cache-busting suffix on font URLs.
const VERSION_QUERY: &str = r"(\?v=\d+\.\d+\.\d+)?$";

/// Built-in option values. None of these are user-overridable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseOptions {
    /// Browser compatibility target for the script transform
    pub browsers: String,

    /// Inline threshold in bytes for fonts and images
    pub inline_threshold: u64,

    /// Development server port
    pub dev_server_port: u16,

    /// Whether the development server uses TLS
    pub dev_server_tls: bool,

    /// Output directory, relative to the root
    pub output_dir: String,

    /// Script bundle filename pattern
    pub script_filename: String,

    /// Extracted stylesheet filename
    pub stylesheet_filename: String,

    /// Emitted asset filename pattern
    pub asset_filename: String,
}

impl Default for BaseOptions {
    fn default() -> Self {
        Self {
            browsers: "ie >= 9".to_string(),
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
            dev_server_port: 9000,
            dev_server_tls: false,
            output_dir: "dist".to_string(),
            script_filename: "[name].js".to_string(),
            stylesheet_filename: "style.css".to_string(),
            asset_filename: "[hash].[ext]".to_string(),
        }
    }
}

/// Resolve the project root to an absolute path.
pub fn resolve_root(root: &Path) -> io::Result<PathBuf> {
    root.canonicalize()
}

/// Builds the base [`ConfigDescriptor`].
#[derive(Debug, Clone)]
pub struct BaseDescriptorBuilder {
    context: PathBuf,
    options: BaseOptions,
    entries: BTreeMap<String, String>,
    rules: Vec<Rule>,
    resolve_extensions: Vec<String>,
}

impl BaseDescriptorBuilder {
    /// Start a builder with no entries and no rules.
    pub fn new(context: impl Into<PathBuf>) -> Self {
        Self {
            context: context.into(),
            options: BaseOptions::default(),
            entries: BTreeMap::new(),
            rules: Vec::new(),
            resolve_extensions: vec![".js".to_string(), ".jsx".to_string(), ".json".to_string()],
        }
    }

    /// Start a builder with the standard entry point and rule table.
    pub fn standard(context: impl Into<PathBuf>, options: BaseOptions) -> Result<Self, RuleError> {
        let context: PathBuf = context.into();
        let rules = standard_rules(&context, &options)?;
        let mut builder = Self::new(context).with_options(options).entry("app", "./src/index");
        builder.rules = rules;
        Ok(builder)
    }

    pub fn with_options(mut self, options: BaseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn entry(mut self, name: &str, path: &str) -> Self {
        self.entries.insert(name.to_string(), path.to_string());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add a module-lookup suffix, ignoring duplicates.
    pub fn resolve_extension(mut self, extension: &str) -> Self {
        if !self.resolve_extensions.iter().any(|e| e == extension) {
            self.resolve_extensions.push(extension.to_string());
        }
        self
    }

    pub fn options(&self) -> &BaseOptions {
        &self.options
    }

    pub fn build(self) -> Result<ConfigDescriptor, RuleError> {
        let rules = RuleTable::from_rules(self.rules)?;
        let output = Output {
            path: self.context.join(&self.options.output_dir),
            filename: self.options.script_filename.clone(),
            public_path: None,
            asset_filename: self.options.asset_filename.clone(),
        };

        Ok(ConfigDescriptor {
            context: self.context,
            entries: self.entries,
            rules,
            output,
            plugins: Vec::new(),
            resolve_extensions: self.resolve_extensions,
            target: Target::Web,
            dev_server: None,
            bail: false,
            devtool: None,
            stats: Stats::default(),
        })
    }
}

/// The base rule table: scripts, fonts, then images.
///
/// Scripts are only transformed inside `<context>/src`.
pub fn standard_rules(context: &Path, options: &BaseOptions) -> Result<Vec<Rule>, RuleError> {
    let script = Rule::new(r"\.jsx?$", AssetCategory::Script)?
        .with_include(PathFilter::below(context, "src")?)
        .with_exclude(PathFilter::new(&["**/node_modules/**"])?)
        .with_transform(Transform::new(Loader::Babel).with_option(
            "presets",
            json!([
                ["env", {"targets": {"browsers": options.browsers}, "modules": false}],
                "stage-2",
                "react"
            ]),
        ));

    let url_font = |ext: &str, mime: &str| -> Result<Rule, RuleError> {
        Ok(Rule::new(&format!(r"\.{}{}", ext, VERSION_QUERY), AssetCategory::Font)?
            .with_transform(
                Transform::new(Loader::Url)
                    .with_option("limit", options.inline_threshold)
                    .with_option("mimetype", mime),
            ))
    };

    let eot = Rule::new(&format!(r"\.eot{}", VERSION_QUERY), AssetCategory::Font)?
        .with_transform(Transform::new(Loader::File));

    let images = Rule::new(r"\.(?:ico|gif|png|jpg|jpeg|webp)$", AssetCategory::Image)?
        .with_transform(
            Transform::new(Loader::Url).with_option("limit", options.inline_threshold),
        );

    Ok(vec![
        script,
        url_font("woff", "application/font-woff")?,
        url_font("woff2", "application/font-woff")?,
        url_font("ttf", "application/octet-stream")?,
        eot,
        url_font("svg", "image/svg+xml")?,
        images,
    ])
}

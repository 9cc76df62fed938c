//! Production overlay for `build`.

use bundle_rules::{AssetCategory, Loader, PathFilter, Rule, RuleError, Transform};
use serde_json::Value;
use std::collections::BTreeMap;

use super::DEV_FLAG;
use crate::config::{BaseOptions, Overlay};
use crate::plugin::{AnalyzerMode, HtmlMinify, Plugin};

/// Extract stylesheets, minify everything, clean the output directory first
/// and abort on the first transform error.
pub fn production_overlay(options: &BaseOptions) -> Result<Overlay, RuleError> {
    let stylesheet = Rule::new(r"\.css$", AssetCategory::Stylesheet)?
        .with_exclude(PathFilter::new(&["**/node_modules/**"])?)
        .with_transform(
            Transform::new(Loader::Css)
                .with_option("modules", false)
                .with_option("importLoaders", 2)
                .with_option("minimize", true)
                .with_option("sourceMap", true),
        )
        .with_fallback(Loader::Style);

    let plugins = vec![
        Plugin::Define {
            definitions: BTreeMap::from([(DEV_FLAG.to_string(), Value::Bool(false))]),
        },
        Plugin::ModuleConcatenation,
        Plugin::BundleAnalyzer {
            analyzer_mode: AnalyzerMode::Static,
            log_level: "error".to_string(),
            report_filename: "report.html".to_string(),
        },
        Plugin::Clean {
            paths: vec![options.output_dir.clone()],
        },
        Plugin::ExtractText {
            filename: options.stylesheet_filename.clone(),
        },
        Plugin::Html {
            inject: true,
            minify: Some(HtmlMinify::aggressive()),
        },
        Plugin::Minify,
    ];

    Ok(Overlay {
        bail: Some(true),
        rules: vec![stylesheet],
        plugins,
        ..Default::default()
    })
}

//! Development overlay for `serve`.

use bundle_rules::{AssetCategory, Loader, Rule, RuleError, Transform};
use serde_json::Value;
use std::collections::BTreeMap;

use super::DEV_FLAG;
use crate::config::{BaseOptions, Overlay};
use crate::descriptor::{DevServer, OutputOverlay};
use crate::plugin::Plugin;

pub const DEV_DEVTOOL: &str = "cheap-module-eval-source-map";

/// Apply styles in place, hot-replace modules and run the dev server.
/// Transform errors do not abort.
pub fn development_overlay(options: &BaseOptions) -> Result<Overlay, RuleError> {
    let stylesheet = Rule::new(r"\.css$", AssetCategory::Stylesheet)?
        .with_transform(Transform::new(Loader::Style))
        .with_transform(Transform::new(Loader::Css));

    let plugins = vec![
        Plugin::Define {
            definitions: BTreeMap::from([(DEV_FLAG.to_string(), Value::Bool(true))]),
        },
        Plugin::HotModuleReplacement,
        Plugin::Html {
            inject: true,
            minify: None,
        },
    ];

    Ok(Overlay {
        bail: Some(false),
        devtool: Some(DEV_DEVTOOL.to_string()),
        rules: vec![stylesheet],
        output: Some(OutputOverlay {
            public_path: Some("/".to_string()),
            ..Default::default()
        }),
        plugins,
        dev_server: Some(DevServer {
            public_path: "/".to_string(),
            compress: true,
            tls: options.dev_server_tls,
            port: options.dev_server_port,
            stats_colors: true,
        }),
        ..Default::default()
    })
}

//! Overlay composition
//!
//! Merges an overlay onto a descriptor with:
//! - Scalars: overlay wins when present
//! - Output options: merged key by key
//! - Plugins: base then overlay, both orders kept
//! - Rules: an overlay rule replaces the base rule with the same pattern,
//!   new patterns are appended
//! - Dev server: taken from the overlay when it supplies one

use bundle_rules::{Rule, RuleTable};
use tracing::debug;

use super::overlay::Overlay;
use crate::descriptor::{ConfigDescriptor, Output, OutputOverlay};

/// Compose `overlay` onto `base`.
///
/// Pure and total: never fails and never touches `base`. Overlays are
/// validated when they are built, so everything reaching here is well formed.
pub fn merge(base: &ConfigDescriptor, overlay: &Overlay) -> ConfigDescriptor {
    let mut merged = base.clone();

    if let Some(bail) = overlay.bail {
        merged.bail = bail;
    }
    if let Some(ref devtool) = overlay.devtool {
        merged.devtool = Some(devtool.clone());
    }
    if let Some(stats) = overlay.stats {
        merged.stats = stats;
    }
    if let Some(ref output) = overlay.output {
        merged.output = merge_output(&base.output, output);
    }
    if let Some(ref server) = overlay.dev_server {
        merged.dev_server = Some(server.clone());
    }

    merged.rules = merge_rules(&base.rules, &overlay.rules);
    merged.plugins.extend(overlay.plugins.iter().cloned());

    debug!(
        rules = merged.rules.len(),
        plugins = merged.plugins.len(),
        bail = merged.bail,
        "merged overlay"
    );

    merged
}

/// Fold several overlays onto `base`, first to last.
pub fn compose(base: &ConfigDescriptor, overlays: &[Overlay]) -> ConfigDescriptor {
    overlays
        .iter()
        .fold(base.clone(), |acc, overlay| merge(&acc, overlay))
}

/// Pattern-supersede merge of rule tables.
pub fn merge_rules(base: &RuleTable, overlay: &[Rule]) -> RuleTable {
    let mut merged = base.clone();
    for rule in overlay {
        if merged.push_or_replace(rule.clone()).is_some() {
            debug!(pattern = rule.test().as_str(), "overlay rule supersedes base rule");
        }
    }
    merged
}

/// Key-wise merge of output options.
pub fn merge_output(base: &Output, overlay: &OutputOverlay) -> Output {
    Output {
        path: overlay.path.clone().unwrap_or_else(|| base.path.clone()),
        filename: overlay
            .filename
            .clone()
            .unwrap_or_else(|| base.filename.clone()),
        public_path: overlay
            .public_path
            .clone()
            .or_else(|| base.public_path.clone()),
        asset_filename: overlay
            .asset_filename
            .clone()
            .unwrap_or_else(|| base.asset_filename.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaseDescriptorBuilder;
    use crate::descriptor::{DevServer, Stats};
    use crate::plugin::Plugin;
    use bundle_rules::{AssetCategory, Loader, Transform};
    use std::path::PathBuf;

    fn base() -> ConfigDescriptor {
        BaseDescriptorBuilder::new("/work/app")
            .entry("app", "./src/index")
            .rule(
                Rule::new(r"\.eot$", AssetCategory::Font)
                    .unwrap()
                    .with_transform(Transform::new(Loader::File)),
            )
            .rule(
                Rule::new(r"\.png$", AssetCategory::Image)
                    .unwrap()
                    .with_transform(Transform::new(Loader::Url)),
            )
            .build()
            .unwrap()
    }

    fn rule(test: &str, loader: Loader) -> Rule {
        Rule::new(test, AssetCategory::Font)
            .unwrap()
            .with_transform(Transform::new(loader))
    }

    #[test]
    fn test_empty_overlay_is_identity() {
        let base = base();
        assert_eq!(merge(&base, &Overlay::default()), base);
    }

    #[test]
    fn test_scalar_override() {
        let overlay = Overlay {
            bail: Some(true),
            devtool: Some("source-map".to_string()),
            stats: Some(Stats { colors: false }),
            ..Default::default()
        };
        let merged = merge(&base(), &overlay);

        assert!(merged.bail());
        assert_eq!(merged.devtool(), Some("source-map"));
        assert!(!merged.stats().colors);
    }

    #[test]
    fn test_scalar_fallback_to_base() {
        let first = merge(
            &base(),
            &Overlay {
                bail: Some(true),
                ..Default::default()
            },
        );
        let second = merge(&first, &Overlay::default());
        assert!(second.bail());
    }

    #[test]
    fn test_output_keywise_merge() {
        let overlay = Overlay {
            output: Some(OutputOverlay {
                public_path: Some("/".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(&base(), &overlay);

        assert_eq!(merged.output().public_path.as_deref(), Some("/"));
        assert_eq!(merged.output().path, PathBuf::from("/work/app/dist"));
        assert_eq!(merged.output().filename, "[name].js");
    }

    #[test]
    fn test_rule_supersede_in_place() {
        let overlay = Overlay {
            rules: vec![rule(r"\.eot$", Loader::Url)],
            ..Default::default()
        };
        let merged = merge(&base(), &overlay);

        assert_eq!(merged.rules().len(), 2);
        let first = merged.rules().iter().next().unwrap();
        assert_eq!(first.test().as_str(), r"\.eot$");
        assert_eq!(first.head().unwrap().loader, Loader::Url);
    }

    #[test]
    fn test_new_rule_appended() {
        let overlay = Overlay {
            rules: vec![rule(r"\.woff$", Loader::Url), rule(r"\.ttf$", Loader::Url)],
            ..Default::default()
        };
        let merged = merge(&base(), &overlay);

        let patterns: Vec<&str> = merged.rules().iter().map(|r| r.test().as_str()).collect();
        assert_eq!(patterns, vec![r"\.eot$", r"\.png$", r"\.woff$", r"\.ttf$"]);
    }

    #[test]
    fn test_plugins_concatenate() {
        let first = merge(
            &base(),
            &Overlay {
                plugins: vec![Plugin::Minify],
                ..Default::default()
            },
        );
        let second = merge(
            &first,
            &Overlay {
                plugins: vec![Plugin::HotModuleReplacement, Plugin::ModuleConcatenation],
                ..Default::default()
            },
        );

        assert_eq!(
            second.plugins(),
            [
                Plugin::Minify,
                Plugin::HotModuleReplacement,
                Plugin::ModuleConcatenation
            ]
        );
    }

    #[test]
    fn test_dev_server_only_from_overlay() {
        let merged = merge(&base(), &Overlay::default());
        assert!(merged.dev_server().is_none());

        let server = DevServer {
            public_path: "/".to_string(),
            compress: true,
            tls: false,
            port: 9000,
            stats_colors: true,
        };
        let merged = merge(
            &base(),
            &Overlay {
                dev_server: Some(server.clone()),
                ..Default::default()
            },
        );
        assert_eq!(merged.dev_server(), Some(&server));
    }

    #[test]
    fn test_merge_does_not_touch_base() {
        let base = base();
        let snapshot = base.clone();
        let _ = merge(
            &base,
            &Overlay {
                bail: Some(true),
                rules: vec![rule(r"\.eot$", Loader::Url)],
                plugins: vec![Plugin::Minify],
                ..Default::default()
            },
        );
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_compose_layers() {
        let overlays = vec![
            Overlay {
                bail: Some(true),
                rules: vec![rule(r"\.eot$", Loader::Url)],
                ..Default::default()
            },
            Overlay {
                bail: Some(false),
                rules: vec![rule(r"\.eot$", Loader::File)],
                ..Default::default()
            },
        ];
        let merged = compose(&base(), &overlays);

        assert!(!merged.bail());
        let eot = merged.rules().lookup("a.eot").rule().unwrap();
        assert_eq!(eot.head().unwrap().loader, Loader::File);
        assert_eq!(merged.rules().len(), 2);
    }
}

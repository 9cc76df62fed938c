//! Asset routing: rule lookup combined with output resolution.
//!
//! This is what the bundling engine consults for each asset it encounters.

use bundle_rules::{AssetCategory, Loader, Lookup};
use serde::Serialize;
use std::path::PathBuf;
use tracing::trace;

use crate::descriptor::ConfigDescriptor;
use crate::output::{Asset, OutputResolver, Resolution};
use crate::plugin::Plugin;

/// How one asset is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum RouteDecision {
    /// No rule matched; the asset is used untransformed
    Passthrough,

    /// Run the transform chain (scripts)
    Transform { rule: usize, loaders: Vec<Loader> },

    /// Inline or emit a static asset (fonts, images)
    Asset {
        rule: usize,
        loaders: Vec<Loader>,
        resolution: Resolution,
    },

    /// Stylesheet chain; `extract_to` is set when styles go to a standalone file
    Stylesheet {
        rule: usize,
        loaders: Vec<Loader>,
        extract_to: Option<PathBuf>,
    },
}

/// Routes assets against a composed descriptor.
#[derive(Debug, Clone)]
pub struct AssetRouter<'a> {
    descriptor: &'a ConfigDescriptor,
    resolver: OutputResolver<'a>,
}

impl<'a> AssetRouter<'a> {
    pub fn new(descriptor: &'a ConfigDescriptor) -> Self {
        Self {
            descriptor,
            resolver: OutputResolver::new(descriptor),
        }
    }

    pub fn resolver(&self) -> &OutputResolver<'a> {
        &self.resolver
    }

    /// Decide how `asset` is processed.
    pub fn route(&self, asset: &Asset<'_>) -> RouteDecision {
        let (index, rule) = match self.descriptor.rules().lookup(asset.path) {
            Lookup::Found { index, rule } => (index, rule),
            Lookup::NotFound => {
                trace!(path = asset.path, "no rule matched");
                return RouteDecision::Passthrough;
            }
        };

        let loaders: Vec<Loader> = rule.chain().iter().map(|t| t.loader).collect();

        match rule.category() {
            AssetCategory::Script => RouteDecision::Transform {
                rule: index,
                loaders,
            },
            AssetCategory::Font | AssetCategory::Image => {
                match self.resolver.policy_for(rule, asset.path) {
                    Some(policy) => RouteDecision::Asset {
                        rule: index,
                        loaders,
                        resolution: self.resolver.resolve(&policy, asset),
                    },
                    None => RouteDecision::Transform {
                        rule: index,
                        loaders,
                    },
                }
            }
            AssetCategory::Stylesheet => {
                let extract_file = self.extract_filename();
                match (rule.fallback(), extract_file) {
                    (Some(_), Some(file)) => RouteDecision::Stylesheet {
                        rule: index,
                        loaders,
                        extract_to: Some(self.descriptor.output().path.join(file)),
                    },
                    // Extraction requested but nothing collects it: the
                    // fallback applies the styles in place
                    (Some(fallback), None) => RouteDecision::Stylesheet {
                        rule: index,
                        loaders: std::iter::once(fallback).chain(loaders).collect(),
                        extract_to: None,
                    },
                    (None, _) => RouteDecision::Stylesheet {
                        rule: index,
                        loaders,
                        extract_to: None,
                    },
                }
            }
        }
    }

    fn extract_filename(&self) -> Option<&'a str> {
        self.descriptor.plugins().iter().find_map(|p| match p {
            Plugin::ExtractText { filename } => Some(filename.as_str()),
            _ => None,
        })
    }
}

impl RouteDecision {
    /// Human-readable summary.
    pub fn to_human(&self, path: &str) -> String {
        let chain = |loaders: &[Loader]| {
            loaders
                .iter()
                .map(Loader::as_str)
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        match self {
            RouteDecision::Passthrough => format!("{}: no rule matched, passed through", path),
            RouteDecision::Transform { rule, loaders } => {
                format!("{}: rule #{} transforms with {}", path, rule, chain(loaders))
            }
            RouteDecision::Asset {
                rule, resolution, ..
            } => match resolution {
                Resolution::Inline { mime, data_uri } => format!(
                    "{}: rule #{} inlines as {} ({} chars)",
                    path,
                    rule,
                    mime,
                    data_uri.len()
                ),
                Resolution::Emit {
                    output_path,
                    public_url,
                    ..
                } => format!(
                    "{}: rule #{} emits {} (served at {})",
                    path,
                    rule,
                    output_path.display(),
                    public_url
                ),
            },
            RouteDecision::Stylesheet {
                rule,
                loaders,
                extract_to,
            } => match extract_to {
                Some(file) => format!(
                    "{}: rule #{} runs {} and extracts into {}",
                    path,
                    rule,
                    chain(loaders),
                    file.display()
                ),
                None => format!("{}: rule #{} applies styles via {}", path, rule, chain(loaders)),
            },
        }
    }
}

//! Output resolution
//!
//! Decides per asset whether it is inlined as a `data:` URI or emitted as a
//! separate file, and names emitted files. Sizes strictly below the
//! threshold are inlined; anything at or above it is emitted.

mod naming;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bundle_rules::{AssetCategory, Loader, Rule};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::DEFAULT_INLINE_THRESHOLD;
use crate::descriptor::{ConfigDescriptor, Output};

pub use naming::{
    content_hash, mime_for_extension, render_filename, split_asset_path, NameParts, HASH_LENGTH,
};

/// A candidate asset: its path and raw contents.
#[derive(Debug, Clone, Copy)]
pub struct Asset<'a> {
    pub path: &'a str,
    pub contents: &'a [u8],
}

impl<'a> Asset<'a> {
    pub fn new(path: &'a str, contents: &'a [u8]) -> Self {
        Self { path, contents }
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

/// Largest asset [`placeholder_contents`] will stand in for.
pub const MAX_PLACEHOLDER_SIZE: u64 = 64 * 1024 * 1024;

/// Zero-filled contents for an asset known only by its size.
///
/// Returns `None` above [`MAX_PLACEHOLDER_SIZE`].
pub fn placeholder_contents(size: u64) -> Option<Vec<u8>> {
    if size > MAX_PLACEHOLDER_SIZE {
        return None;
    }
    Some(vec![0u8; usize::try_from(size).ok()?])
}

/// Inline-or-emit policy for one asset category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetPolicy {
    /// Assets strictly smaller than this many bytes are inlined
    pub threshold: u64,
    /// MIME type used for inlined payloads
    pub mime: String,
}

/// Where an asset ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Inline,
    Emit,
}

impl AssetPolicy {
    /// Threshold is exclusive on the inline side.
    pub fn disposition(&self, size: u64) -> Disposition {
        if size < self.threshold {
            Disposition::Inline
        } else {
            Disposition::Emit
        }
    }
}

/// The resolved output for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", rename_all = "lowercase")]
pub enum Resolution {
    Inline {
        mime: String,
        data_uri: String,
    },
    #[serde(rename_all = "camelCase")]
    Emit {
        file_name: String,
        output_path: PathBuf,
        public_url: String,
    },
}

impl Resolution {
    pub fn disposition(&self) -> Disposition {
        match self {
            Resolution::Inline { .. } => Disposition::Inline,
            Resolution::Emit { .. } => Disposition::Emit,
        }
    }
}

/// Derives asset policies and names from a composed descriptor.
#[derive(Debug, Clone)]
pub struct OutputResolver<'a> {
    output: &'a Output,
    default_threshold: u64,
}

impl<'a> OutputResolver<'a> {
    pub fn new(descriptor: &'a ConfigDescriptor) -> Self {
        Self {
            output: descriptor.output(),
            default_threshold: DEFAULT_INLINE_THRESHOLD,
        }
    }

    /// Override the threshold used by rules that carry no `limit` option.
    pub fn with_default_threshold(mut self, threshold: u64) -> Self {
        self.default_threshold = threshold;
        self
    }

    /// Policy for assets routed by `rule`, or `None` for categories that are
    /// never inlined or emitted as-is (scripts, stylesheets).
    ///
    /// A url-loader rule inlines below its `limit` (default threshold when
    /// absent); a file-loader rule always emits.
    pub fn policy_for(&self, rule: &Rule, path: &str) -> Option<AssetPolicy> {
        if !matches!(rule.category(), AssetCategory::Font | AssetCategory::Image) {
            return None;
        }

        let (_, ext) = split_asset_path(path);
        let head = rule.head()?;

        let threshold = match head.loader {
            Loader::Url => head
                .option("limit")
                .and_then(|v| v.as_u64())
                .unwrap_or(self.default_threshold),
            Loader::File => 0,
            _ => return None,
        };
        let mime = head
            .option("mimetype")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| mime_for_extension(ext))
            .to_string();

        Some(AssetPolicy { threshold, mime })
    }

    /// Resolve an asset under a policy.
    pub fn resolve(&self, policy: &AssetPolicy, asset: &Asset<'_>) -> Resolution {
        match policy.disposition(asset.size()) {
            Disposition::Inline => Resolution::Inline {
                mime: policy.mime.clone(),
                data_uri: format!("data:{};base64,{}", policy.mime, STANDARD.encode(asset.contents)),
            },
            Disposition::Emit => {
                let file_name = self.asset_filename(asset);
                Resolution::Emit {
                    output_path: self.output.path.join(&file_name),
                    public_url: self.public_url(&file_name),
                    file_name,
                }
            }
        }
    }

    /// Name of an emitted asset. Identical contents give identical names.
    pub fn asset_filename(&self, asset: &Asset<'_>) -> String {
        let (name, ext) = split_asset_path(asset.path);
        let hash = content_hash(asset.contents);
        render_filename(
            &self.output.asset_filename,
            &NameParts {
                name,
                ext,
                hash: &hash,
            },
        )
    }

    /// File name of the script bundle for an entry.
    pub fn bundle_filename(&self, bundle: &str) -> String {
        render_filename(
            &self.output.filename,
            &NameParts {
                name: bundle,
                ext: "js",
                hash: "",
            },
        )
    }

    /// URL under which an emitted file is served.
    pub fn public_url(&self, file_name: &str) -> String {
        match self.output.public_path.as_deref() {
            Some(prefix) if prefix.ends_with('/') => format!("{}{}", prefix, file_name),
            Some(prefix) => format!("{}/{}", prefix, file_name),
            None => file_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BaseDescriptorBuilder, BaseOptions};
    use bundle_rules::Transform;

    fn descriptor() -> ConfigDescriptor {
        BaseDescriptorBuilder::standard("/work/app", BaseOptions::default())
            .unwrap()
            .build()
            .unwrap()
    }

    fn font_policy(d: &ConfigDescriptor, path: &str) -> AssetPolicy {
        let rule = d.rules().lookup(path).rule().unwrap();
        OutputResolver::new(d).policy_for(rule, path).unwrap()
    }

    #[test]
    fn test_threshold_boundary() {
        let policy = AssetPolicy {
            threshold: 10_000,
            mime: "image/png".to_string(),
        };
        assert_eq!(policy.disposition(9_999), Disposition::Inline);
        assert_eq!(policy.disposition(10_000), Disposition::Emit);
        assert_eq!(policy.disposition(0), Disposition::Inline);
    }

    #[test]
    fn test_policy_from_url_loader_options() {
        let d = descriptor();
        let policy = font_policy(&d, "fonts/a.ttf");
        assert_eq!(policy.threshold, 10_000);
        assert_eq!(policy.mime, "application/octet-stream");
    }

    #[test]
    fn test_image_policy_from_base_limit() {
        let d = descriptor();
        let policy = font_policy(&d, "img/logo.png");
        assert_eq!(policy.threshold, DEFAULT_INLINE_THRESHOLD);
        assert_eq!(policy.mime, "image/png");
    }

    #[test]
    fn test_file_loader_never_inlines() {
        let d = descriptor();
        let policy = font_policy(&d, "fonts/a.eot");
        assert_eq!(policy.threshold, 0);
        assert_eq!(policy.disposition(0), Disposition::Emit);
    }

    #[test]
    fn test_no_policy_for_scripts() {
        let d = descriptor();
        let rule = d.rules().lookup("src/index.js").rule().unwrap();
        assert!(OutputResolver::new(&d).policy_for(rule, "src/index.js").is_none());
    }

    #[test]
    fn test_inline_data_uri() {
        let d = descriptor();
        let resolver = OutputResolver::new(&d);
        let policy = AssetPolicy {
            threshold: 10,
            mime: "image/svg+xml".to_string(),
        };
        let resolution = resolver.resolve(&policy, &Asset::new("a.svg", b"<svg/>"));
        assert_eq!(
            resolution,
            Resolution::Inline {
                mime: "image/svg+xml".to_string(),
                data_uri: "data:image/svg+xml;base64,PHN2Zy8+".to_string(),
            }
        );
    }

    #[test]
    fn test_emit_stable_name() {
        let d = descriptor();
        let resolver = OutputResolver::new(&d);
        let policy = AssetPolicy {
            threshold: 4,
            mime: "image/png".to_string(),
        };
        let contents = b"not really a png";

        let first = resolver.resolve(&policy, &Asset::new("img/a.png", contents));
        let second = resolver.resolve(&policy, &Asset::new("img/a.png", contents));
        assert_eq!(first, second);

        match first {
            Resolution::Emit {
                file_name,
                output_path,
                public_url,
            } => {
                assert_eq!(file_name, format!("{}.png", content_hash(contents)));
                assert_eq!(output_path, d.output().path.join(&file_name));
                assert_eq!(public_url, file_name);
            }
            other => panic!("expected emit, got {:?}", other),
        }
    }

    #[test]
    fn test_bundle_filename_and_public_url() {
        let d = descriptor();
        let resolver = OutputResolver::new(&d).with_default_threshold(1);
        assert_eq!(resolver.bundle_filename("app"), "app.js");
        assert_eq!(resolver.public_url("app.js"), "app.js");
    }

    #[test]
    fn test_custom_default_threshold() {
        let d = descriptor();
        let rule = Rule::new(r"\.gif$", AssetCategory::Image)
            .unwrap()
            .with_transform(Transform::new(Loader::Url));
        let policy = OutputResolver::new(&d)
            .with_default_threshold(512)
            .policy_for(&rule, "a.gif")
            .unwrap();
        assert_eq!(policy.threshold, 512);
        assert_eq!(policy.mime, "image/gif");
    }

    #[test]
    fn test_placeholder_contents_capped() {
        assert_eq!(placeholder_contents(3), Some(vec![0, 0, 0]));
        assert!(placeholder_contents(MAX_PLACEHOLDER_SIZE + 1).is_none());
        assert!(placeholder_contents(u64::MAX).is_none());
    }
}

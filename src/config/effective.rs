//! Effective configuration with provenance
//!
//! Wraps the composed descriptor with the mode, the overlays that went into
//! it and a digest that is identical for identical descriptors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use super::base::{resolve_root, BaseDescriptorBuilder, BaseOptions};
use super::merge::compose;
use super::overlay::Overlay;
use crate::descriptor::ConfigDescriptor;
use crate::error::ComposeError;
use crate::profile::Mode;

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "bundle-config/effective_config@1";

/// Origin of an overlay
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OverlayOrigin {
    Profile,
    File,
}

/// An overlay that contributed to the descriptor
#[derive(Debug, Clone, Serialize)]
pub struct OverlaySource {
    pub origin: OverlayOrigin,

    /// File path (None for profiles)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for profiles)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Composed descriptor with provenance
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,
    pub schema_id: String,
    pub created_at: DateTime<Utc>,
    pub mode: Mode,

    /// SHA-256 of the canonical JSON of `descriptor`
    pub digest: String,

    /// Overlays in composition order
    pub sources: Vec<OverlaySource>,

    pub descriptor: ConfigDescriptor,
}

impl EffectiveConfig {
    /// Compose the descriptor for `mode` under `root`.
    ///
    /// `extra` overlay files are composed after the profile overlay, in order.
    pub fn build(
        mode: Mode,
        root: &Path,
        options: &BaseOptions,
        extra: &[PathBuf],
    ) -> Result<Self, ComposeError> {
        let context = resolve_root(root).map_err(|source| ComposeError::Root {
            path: root.to_path_buf(),
            source,
        })?;

        let base = BaseDescriptorBuilder::standard(context, options.clone())?.build()?;

        let mut overlays = vec![mode.overlay(options)?];
        let mut sources = vec![OverlaySource {
            origin: OverlayOrigin::Profile,
            path: None,
            digest: None,
        }];

        for path in extra {
            let bytes = fs::read(path).map_err(|e| ComposeError::Io(e.to_string()))?;
            overlays.push(Overlay::from_file(path)?);
            sources.push(OverlaySource {
                origin: OverlayOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(sha256_hex(&bytes)),
            });
        }

        let descriptor = compose(&base, &overlays);
        let digest = Self::compute_digest(&descriptor)?;

        info!(
            %mode,
            root = %descriptor.context().display(),
            rules = descriptor.rules().len(),
            plugins = descriptor.plugins().len(),
            digest = %digest,
            "composed descriptor"
        );

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            mode,
            digest,
            sources,
            descriptor,
        })
    }

    /// Digest of a descriptor using RFC 8785 JSON Canonicalization
    pub fn compute_digest(descriptor: &ConfigDescriptor) -> Result<String, ComposeError> {
        let jcs_bytes = serde_json_canonicalizer::to_vec(descriptor)
            .map_err(|e| ComposeError::Serialize(e.to_string()))?;
        Ok(sha256_hex(&jcs_bytes))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            )
        })?;
        fs::write(path, json)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_build_production() {
        let root = tempfile::tempdir().unwrap();
        let config =
            EffectiveConfig::build(Mode::Production, root.path(), &BaseOptions::default(), &[])
                .unwrap();

        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.mode, Mode::Production);
        assert!(config.descriptor.bail());
        assert!(config.descriptor.context().is_absolute());
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, OverlayOrigin::Profile);
        assert_eq!(config.digest.len(), 64);
    }

    #[test]
    fn test_digest_deterministic() {
        let root = tempfile::tempdir().unwrap();
        let options = BaseOptions::default();
        let a = EffectiveConfig::build(Mode::Development, root.path(), &options, &[]).unwrap();
        let b = EffectiveConfig::build(Mode::Development, root.path(), &options, &[]).unwrap();
        let c = EffectiveConfig::build(Mode::Production, root.path(), &options, &[]).unwrap();

        assert_eq!(a.digest, b.digest);
        assert_ne!(a.digest, c.digest);
    }

    #[test]
    fn test_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");
        let err = EffectiveConfig::build(Mode::Production, &missing, &BaseOptions::default(), &[])
            .unwrap_err();
        assert!(matches!(err, ComposeError::Root { .. }));
    }

    #[test]
    fn test_extra_overlay_file() {
        let root = tempfile::tempdir().unwrap();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "devtool = \"source-map\"").unwrap();

        let config = EffectiveConfig::build(
            Mode::Production,
            root.path(),
            &BaseOptions::default(),
            &[file.path().to_path_buf()],
        )
        .unwrap();

        assert_eq!(config.descriptor.devtool(), Some("source-map"));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].origin, OverlayOrigin::File);
        assert!(config.sources[1].digest.is_some());
    }

    #[test]
    fn test_to_json() {
        let root = tempfile::tempdir().unwrap();
        let config =
            EffectiveConfig::build(Mode::Development, root.path(), &BaseOptions::default(), &[])
                .unwrap();
        let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();

        assert_eq!(value["mode"], "development");
        assert_eq!(value["descriptor"]["devServer"]["port"], 9000);
        assert_eq!(value["descriptor"]["target"], "web");
        assert_eq!(value["descriptor"]["entries"]["app"], "./src/index");
    }
}

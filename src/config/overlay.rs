//! Overlay fragments contributed by profiles or configuration files.

use bundle_rules::{Rule, RuleError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::descriptor::{DevServer, OutputOverlay, Stats};
use crate::plugin::Plugin;

/// A partial configuration composed onto the base descriptor.
///
/// There are no `entries`, `context`, `target` or
/// `resolveExtensions` fields: those are fixed once the base is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Overlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bail: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtool: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputOverlay>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServer>,
}

impl Overlay {
    /// Parse and validate a TOML fragment.
    pub fn from_toml_str(contents: &str) -> Result<Self, OverlayError> {
        let overlay: Overlay =
            toml::from_str(contents).map_err(|e| OverlayError::ParseError(e.to_string()))?;
        overlay.validate()?;
        Ok(overlay)
    }

    /// Parse and validate a JSON fragment.
    pub fn from_json_str(contents: &str) -> Result<Self, OverlayError> {
        let overlay: Overlay = serde_json::from_str(contents)
            .map_err(|e| OverlayError::ParseError(e.to_string()))?;
        overlay.validate()?;
        Ok(overlay)
    }

    /// Load a fragment, choosing the format from the file extension.
    pub fn from_file(path: &Path) -> Result<Self, OverlayError> {
        let contents =
            fs::read_to_string(path).map_err(|e| OverlayError::IoError(e.to_string()))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            _ => Err(OverlayError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Check the fragment is internally consistent.
    ///
    /// Each rule must be well formed and no two rules may share a pattern,
    /// since the merge would otherwise keep whichever came last.
    pub fn validate(&self) -> Result<(), OverlayError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            rule.validate()?;
            if !seen.insert(rule.test().clone()) {
                return Err(RuleError::DuplicatePattern(rule.test().as_str().to_string()).into());
            }
        }

        if let Some(ref server) = self.dev_server {
            if server.port == 0 {
                return Err(OverlayError::ValidationError(
                    "devServer.port must be non-zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Overlay loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported overlay format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const STYLE_OVERLAY: &str = r#"
bail = true

[output]
publicPath = "/static/"

[[rules]]
test = '\.css$'
category = "stylesheet"
fallback = "style-loader"
exclude = ["**/node_modules/**"]

[[rules.use]]
loader = "css-loader"
options = { minimize = true, sourceMap = true }

[[plugins]]
plugin = "extract-text"
filename = "style.css"
"#;

    #[test]
    fn test_parse_toml() {
        let overlay = Overlay::from_toml_str(STYLE_OVERLAY).unwrap();

        assert_eq!(overlay.bail, Some(true));
        assert_eq!(overlay.rules.len(), 1);
        assert!(overlay.rules[0].extracts());
        assert_eq!(
            overlay.output.as_ref().and_then(|o| o.public_path.as_deref()),
            Some("/static/")
        );
        assert_eq!(
            overlay.plugins,
            vec![Plugin::ExtractText {
                filename: "style.css".to_string()
            }]
        );
    }

    #[test]
    fn test_rule_without_pattern_is_composition_error() {
        let toml = r#"
[[rules]]
category = "image"

[[rules.use]]
loader = "url-loader"
"#;
        let err = Overlay::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, OverlayError::ParseError(_)));
        assert!(err.to_string().contains("no test pattern"));
    }

    #[test]
    fn test_entries_cannot_be_overridden() {
        let err = Overlay::from_json_str(r#"{"entries": {"admin": "./src/admin"}}"#).unwrap_err();
        assert!(matches!(err, OverlayError::ParseError(_)));
    }

    #[test]
    fn test_duplicate_patterns_rejected() {
        let json = r#"{"rules": [
            {"test": "\\.css$", "category": "stylesheet", "use": [{"loader": "css-loader"}]},
            {"test": "\\.css$", "category": "stylesheet", "use": [{"loader": "style-loader"}]}
        ]}"#;
        let err = Overlay::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            OverlayError::Rule(RuleError::DuplicatePattern(_))
        ));
    }

    #[test]
    fn test_zero_port_rejected() {
        let json = r#"{"devServer": {"publicPath": "/", "compress": true, "tls": false, "port": 0}}"#;
        let err = Overlay::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("devServer.port"));
    }

    #[test]
    fn test_from_file() {
        let mut temp = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(temp, "{}", STYLE_OVERLAY).unwrap();

        let overlay = Overlay::from_file(temp.path()).unwrap();
        assert_eq!(overlay.rules.len(), 1);
    }

    #[test]
    fn test_from_file_unsupported_extension() {
        let temp = NamedTempFile::new().unwrap();
        let err = Overlay::from_file(temp.path()).unwrap_err();
        assert!(matches!(err, OverlayError::UnsupportedFormat(_)));
    }
}

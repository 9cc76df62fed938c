//! Path matchers: regex test patterns and glob include/exclude filters.

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::RuleError;

/// A regular expression over a file path.
///
/// Equality and hashing use the pattern source only, so two rules written
/// with the same expression are the same routing key regardless of how the
/// compiled automaton compares.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestPattern {
    source: String,
    regex: Regex,
}

impl TestPattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, RuleError> {
        if source.trim().is_empty() {
            return Err(RuleError::EmptyPattern);
        }
        let regex = Regex::new(source).map_err(|e| RuleError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether the pattern matches anywhere in `path`.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl PartialEq for TestPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for TestPattern {}

impl Hash for TestPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl fmt::Debug for TestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TestPattern").field(&self.source).finish()
    }
}

impl fmt::Display for TestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

impl TryFrom<String> for TestPattern {
    type Error = RuleError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(&source)
    }
}

impl From<TestPattern> for String {
    fn from(pattern: TestPattern) -> Self {
        pattern.source
    }
}

/// A set of path globs used as a rule's include or exclude condition.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PathFilter {
    globs: Vec<String>,
    set: GlobSet,
}

impl PathFilter {
    /// Build a filter from glob patterns.
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self, RuleError> {
        let mut builder = GlobSetBuilder::new();
        let mut sources = Vec::with_capacity(globs.len());

        for glob in globs {
            let glob = glob.as_ref();
            let compiled = Glob::new(glob).map_err(|e| RuleError::InvalidGlob {
                glob: glob.to_string(),
                reason: e.to_string(),
            })?;
            builder.add(compiled);
            sources.push(glob.to_string());
        }

        let set = builder.build().map_err(|e| RuleError::InvalidGlob {
            glob: sources.join(","),
            reason: e.to_string(),
        })?;

        Ok(Self {
            globs: sources,
            set,
        })
    }

    /// Match everything inside `dir` under `root`.
    ///
    /// Accepts the absolute form (`<root>/<dir>/...`) and the form relative
    /// to the root (`<dir>/...`). Metacharacters in either path are escaped.
    pub fn below(root: &Path, dir: &str) -> Result<Self, RuleError> {
        let dir = dir.trim_matches('/');
        let absolute = root.join(dir);
        Self::new(&[
            format!("{}/**", globset::escape(&absolute.to_string_lossy())),
            format!("{}/**", globset::escape(dir)),
        ])
    }

    /// A filter with no globs.
    pub fn empty() -> Self {
        Self {
            globs: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    /// Check if any glob matches the path.
    pub fn is_match(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    /// The glob sources, in the order given.
    pub fn globs(&self) -> &[String] {
        &self.globs
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for PathFilter {
    fn eq(&self, other: &Self) -> bool {
        self.globs == other.globs
    }
}

impl Eq for PathFilter {}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.globs).finish()
    }
}

impl TryFrom<Vec<String>> for PathFilter {
    type Error = RuleError;

    fn try_from(globs: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(&globs)
    }
}

impl From<PathFilter> for Vec<String> {
    fn from(filter: PathFilter) -> Self {
        filter.globs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matches_suffix() {
        let pattern = TestPattern::new(r"\.jsx?$").unwrap();
        assert!(pattern.is_match("src/index.js"));
        assert!(pattern.is_match("src/App.jsx"));
        assert!(!pattern.is_match("src/App.json"));
    }

    #[test]
    fn test_pattern_version_query() {
        let pattern = TestPattern::new(r"\.woff(\?v=\d+\.\d+\.\d+)?$").unwrap();
        assert!(pattern.is_match("fonts/icons.woff"));
        assert!(pattern.is_match("fonts/icons.woff?v=4.7.0"));
        assert!(!pattern.is_match("fonts/icons.woff2"));
    }

    #[test]
    fn test_pattern_equality_is_structural() {
        let a = TestPattern::new(r"\.css$").unwrap();
        let b = TestPattern::new(r"\.css$").unwrap();
        let c = TestPattern::new(r"\.s?css$").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert_eq!(TestPattern::new("  ").unwrap_err(), RuleError::EmptyPattern);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = TestPattern::new(r"\.(css$").unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn test_pattern_serde() {
        let pattern: TestPattern = serde_json::from_str(r#""\\.svg$""#).unwrap();
        assert_eq!(pattern.as_str(), r"\.svg$");
        assert_eq!(serde_json::to_string(&pattern).unwrap(), r#""\\.svg$""#);

        let bad: Result<TestPattern, _> = serde_json::from_str(r#""""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_filter_node_modules() {
        let filter = PathFilter::new(&["**/node_modules/**"]).unwrap();
        assert!(filter.is_match("node_modules/react/index.js"));
        assert!(filter.is_match("/home/dev/app/node_modules/react/index.js"));
        assert!(!filter.is_match("src/index.js"));
    }

    #[test]
    fn test_empty_filter() {
        let filter = PathFilter::empty();
        assert!(filter.is_empty());
        assert!(!filter.is_match("anything.js"));
    }

    #[test]
    fn test_invalid_glob() {
        let err = PathFilter::new(&["src/[abc"]).unwrap_err();
        assert!(matches!(err, RuleError::InvalidGlob { .. }));
    }

    #[test]
    fn test_below_is_anchored_to_root() {
        let filter = PathFilter::below(Path::new("/home/dev/src/app"), "src").unwrap();

        assert!(filter.is_match("/home/dev/src/app/src/index.js"));
        assert!(filter.is_match("src/components/App.jsx"));
        assert!(!filter.is_match("/home/dev/src/app/lib/util.js"));
        assert!(!filter.is_match("/home/dev/app/vendor/src/x.js"));
        assert!(!filter.is_match("lib/util.js"));
        assert!(!filter.is_match("vendor/src/x.js"));
    }

    #[test]
    fn test_below_escapes_metacharacters() {
        let filter = PathFilter::below(Path::new("/work/[app]"), "src").unwrap();
        assert!(filter.is_match("/work/[app]/src/index.js"));
        assert!(!filter.is_match("/work/a/src/index.js"));
    }
}

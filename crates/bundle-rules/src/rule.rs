//! Rule types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{PathFilter, RuleError, TestPattern};

/// The asset category a rule routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Script,
    Font,
    Image,
    Stylesheet,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Script => "script",
            AssetCategory::Font => "font",
            AssetCategory::Image => "image",
            AssetCategory::Stylesheet => "stylesheet",
        }
    }
}

/// Transformers the external bundling engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Loader {
    #[serde(rename = "babel-loader")]
    Babel,
    #[serde(rename = "url-loader")]
    Url,
    #[serde(rename = "file-loader")]
    File,
    #[serde(rename = "css-loader")]
    Css,
    #[serde(rename = "style-loader")]
    Style,
}

impl Loader {
    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Babel => "babel-loader",
            Loader::Url => "url-loader",
            Loader::File => "file-loader",
            Loader::Css => "css-loader",
            Loader::Style => "style-loader",
        }
    }
}

/// One step of a transform chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub loader: Loader,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl Transform {
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            options: Map::new(),
        }
    }

    /// Set an option, replacing any previous value for the key.
    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

/// An asset-routing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleSpec", into = "RuleSpec")]
pub struct Rule {
    test: TestPattern,
    category: AssetCategory,
    chain: Vec<Transform>,
    fallback: Option<Loader>,
    include: PathFilter,
    exclude: PathFilter,
}

impl Rule {
    /// Create a rule with an empty chain.
    ///
    /// Chains are filled with [`Rule::with_transform`]; [`Rule::validate`]
    /// rejects a rule that is still empty.
    pub fn new(test: &str, category: AssetCategory) -> Result<Self, RuleError> {
        Ok(Self {
            test: TestPattern::new(test)?,
            category,
            chain: Vec::new(),
            fallback: None,
            include: PathFilter::empty(),
            exclude: PathFilter::empty(),
        })
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.chain.push(transform);
        self
    }

    /// Set the transformer used when extraction is unavailable.
    pub fn with_fallback(mut self, loader: Loader) -> Self {
        self.fallback = Some(loader);
        self
    }

    pub fn with_include(mut self, include: PathFilter) -> Self {
        self.include = include;
        self
    }

    pub fn with_exclude(mut self, exclude: PathFilter) -> Self {
        self.exclude = exclude;
        self
    }

    /// Check structural requirements that the builder methods cannot.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.chain.is_empty() {
            return Err(RuleError::EmptyChain {
                pattern: self.test.as_str().to_string(),
            });
        }
        Ok(())
    }

    pub fn test(&self) -> &TestPattern {
        &self.test
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    pub fn chain(&self) -> &[Transform] {
        &self.chain
    }

    pub fn fallback(&self) -> Option<Loader> {
        self.fallback
    }

    pub fn include(&self) -> &PathFilter {
        &self.include
    }

    pub fn exclude(&self) -> &PathFilter {
        &self.exclude
    }

    /// The first transformer applied to a matched asset.
    pub fn head(&self) -> Option<&Transform> {
        self.chain.first()
    }

    /// Whether the chain output is meant to be extracted into a standalone
    /// artifact (a fallback is only meaningful for extraction chains).
    pub fn extracts(&self) -> bool {
        self.fallback.is_some()
    }

    /// Look up an option on the first transform using `loader`.
    pub fn loader_option(&self, loader: Loader, key: &str) -> Option<&Value> {
        self.chain
            .iter()
            .find(|t| t.loader == loader)
            .and_then(|t| t.option(key))
    }

    /// Check whether this rule applies to `path`.
    pub fn matches(&self, path: &str) -> bool {
        if !self.test.is_match(path) {
            return false;
        }
        if !self.include.is_empty() && !self.include.is_match(path) {
            return false;
        }
        !self.exclude.is_match(path)
    }
}

/// Raw, unvalidated rule as written in a configuration fragment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<AssetCategory>,

    #[serde(default, rename = "use")]
    pub chain: Vec<Transform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Loader>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl TryFrom<RuleSpec> for Rule {
    type Error = RuleError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        let test = spec.test.ok_or(RuleError::MissingPattern)?;
        let category = spec.category.ok_or_else(|| RuleError::MissingCategory {
            pattern: test.clone(),
        })?;

        let rule = Rule {
            test: TestPattern::new(&test)?,
            category,
            chain: spec.chain,
            fallback: spec.fallback,
            include: PathFilter::new(&spec.include)?,
            exclude: PathFilter::new(&spec.exclude)?,
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl From<Rule> for RuleSpec {
    fn from(rule: Rule) -> Self {
        RuleSpec {
            test: Some(rule.test.into()),
            category: Some(rule.category),
            chain: rule.chain,
            fallback: rule.fallback,
            include: rule.include.into(),
            exclude: rule.exclude.into(),
        }
    }
}

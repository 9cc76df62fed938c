//! The ordered rule table.

use serde::Serialize;

use crate::{Rule, RuleError, TestPattern};

/// Result of looking a path up in a [`RuleTable`].
///
/// `NotFound` is a pass-through signal, not an error: the asset is handed to
/// the bundling engine untransformed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Found { index: usize, rule: &'a Rule },
    NotFound,
}

impl<'a> Lookup<'a> {
    pub fn rule(&self) -> Option<&'a Rule> {
        match self {
            Lookup::Found { rule, .. } => Some(rule),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found { .. })
    }
}

/// Ordered sequence of rules with unique test patterns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rules in order.
    ///
    /// Every rule is validated, and two rules with the same test pattern are
    /// rejected since their relative order would be ambiguous.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut table = Self::new();
        for rule in rules {
            rule.validate()?;
            if table.find(rule.test()).is_some() {
                return Err(RuleError::DuplicatePattern(rule.test().as_str().to_string()));
            }
            table.rules.push(rule);
        }
        Ok(table)
    }

    /// Insert a rule, replacing in place any rule with the same pattern.
    ///
    /// Returns the replaced rule, if any. A rule with a new pattern is
    /// appended.
    pub fn push_or_replace(&mut self, rule: Rule) -> Option<Rule> {
        match self.position(rule.test()) {
            Some(index) => Some(std::mem::replace(&mut self.rules[index], rule)),
            None => {
                self.rules.push(rule);
                None
            }
        }
    }

    /// Find the rule that must process `path`.
    ///
    /// All rules are evaluated in table order and the last match wins.
    pub fn lookup(&self, path: &str) -> Lookup<'_> {
        self.rules
            .iter()
            .enumerate()
            .rev()
            .find(|(_, rule)| rule.matches(path))
            .map(|(index, rule)| Lookup::Found { index, rule })
            .unwrap_or(Lookup::NotFound)
    }

    /// Find the rule with exactly this pattern.
    pub fn find(&self, pattern: &TestPattern) -> Option<&Rule> {
        self.rules.iter().find(|r| r.test() == pattern)
    }

    fn position(&self, pattern: &TestPattern) -> Option<usize> {
        self.rules.iter().position(|r| r.test() == pattern)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

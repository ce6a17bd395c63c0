use std::collections::HashMap;
use std::fmt;

use super::error::BuildError;
use super::rule::RuleEntry;

/// Builder for assembling a [`RuleSet`] from [`RuleEntry`] values in code.
///
/// # Example
///
/// ```
/// use ruleforge::{lit, var, RuleEntry, RuleSetBuilder, ThenScope};
///
/// let ruleset = RuleSetBuilder::new()
///     .rule(RuleEntry::new(
///         "Adult",
///         var("user.Age").gte(lit(18_i64)),
///         ThenScope::default().assign("user.Adult", lit(true)),
///     ))
///     .build()
///     .unwrap();
/// assert_eq!(ruleset.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<RuleEntry>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rule(mut self, rule: RuleEntry) -> Self {
        self.rules.push(rule);
        self
    }

    /// Collect the rules in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError::DuplicateRule`] for every repeated name and a
    /// [`BuildError::Malformed`] for every rule without actions.
    pub fn build(self) -> Result<RuleSet, Vec<BuildError>> {
        let mut ruleset = RuleSet::default();
        let mut errors = Vec::new();
        for rule in self.rules {
            if rule.then.assignments.expressions.is_empty() {
                errors.push(BuildError::Malformed {
                    rule: rule.name,
                    message: "rule has no actions".to_owned(),
                });
                continue;
            }
            if let Err(rejected) = ruleset.insert(rule) {
                errors.push(BuildError::DuplicateRule {
                    name: rejected.name,
                });
            }
        }
        if errors.is_empty() {
            Ok(ruleset)
        } else {
            Err(errors)
        }
    }
}

/// An immutable collection of uniquely named rules in source order.
///
/// Holds no host data, so one `RuleSet` can be shared across threads and run
/// against many [`DataContext`](super::DataContext)s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<RuleEntry>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    /// Add a rule, handing it back if the name is already taken.
    pub(crate) fn insert(&mut self, rule: RuleEntry) -> Result<(), RuleEntry> {
        if self.index.contains_key(&rule.name) {
            return Err(rule);
        }
        self.index.insert(rule.name.clone(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RuleEntry> {
        self.index.get(name).map(|&i| &self.rules[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in the order they were defined.
    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.rules.iter()
    }

    /// Rule names in the order they were defined.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Parse DSL text and build it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleforgeError::Parse`](crate::RuleforgeError::Parse) for
    /// invalid syntax, or [`RuleforgeError::Build`](crate::RuleforgeError::Build)
    /// with every build error when the text does not produce a clean rule set.
    pub fn from_dsl(input: &str) -> Result<Self, crate::RuleforgeError> {
        let (ruleset, errors) = crate::build(input);
        if errors.is_empty() {
            return Ok(ruleset);
        }
        if let [BuildError::Syntax(e)] = errors.as_slice() {
            return Err(crate::RuleforgeError::Parse(e.clone()));
        }
        Err(crate::RuleforgeError::Build(errors))
    }

    /// Read a DSL file and build it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleforgeError`](crate::RuleforgeError) on I/O or build failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::RuleforgeError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }
}

#[cfg(feature = "binary-cache")]
impl RuleSet {
    /// Serialize this rule set to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata. Callers can use this to detect when the original
    /// source has changed and the cache should be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a rule set from bytes produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Like [`from_bytes`](Self::from_bytes), but returns `Ok(None)` when the
    /// bytes were not written from exactly `source_text`, i.e. the cache is
    /// stale and the rules should be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes_if_current(
        bytes: &[u8],
        source_text: &str,
    ) -> Result<Option<Self>, crate::serial::DeserializeError> {
        crate::serial::decode_if_current(bytes, source_text)
    }

    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

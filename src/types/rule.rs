use std::fmt;

#[cfg(feature = "binary-cache")]
use serde::{Deserialize, Serialize};

use super::action::ThenScope;
use super::expr::{write_quoted, Expression};

/// The `when` block of a rule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct WhenScope {
    pub expression: Expression,
}

/// A named rule: a condition, a block of actions and a salience used to pick
/// between rules whose conditions hold in the same cycle.
///
/// Rules are usually produced by [`build`](crate::build) or
/// [`RuleSet::from_dsl()`](super::RuleSet::from_dsl), but can be assembled
/// directly with [`RuleEntry::new`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(Serialize, Deserialize))]
pub struct RuleEntry {
    pub name: String,
    pub description: String,
    pub salience: i64,
    pub when: WhenScope,
    pub then: ThenScope,
}

impl RuleEntry {
    pub fn new(name: impl Into<String>, when: impl Into<Expression>, then: ThenScope) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            salience: 0,
            when: WhenScope {
                expression: when.into(),
            },
            then,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_salience(mut self, salience: i64) -> Self {
        self.salience = salience;
        self
    }
}

impl fmt::Display for WhenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_quoted(f, self.0)
    }
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule {} {} salience {} when {} then {} end",
            Quoted(&self.name),
            Quoted(&self.description),
            self.salience,
            self.when,
            self.then
        )
    }
}

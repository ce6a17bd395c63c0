//! A forward-chaining rules engine with a small embedded DSL.
//!
//! Rules are written as
//!
//! ```text
//! rule "Adult" "marks adults" salience 10
//! when
//!     user.Age >= 18 && user.Adult == false
//! then
//!     user.Adult = true;
//! end
//! ```
//!
//! and built into a [`RuleSet`]. An [`Engine`] runs the rule set against a
//! [`DataContext`] of host objects: each cycle it evaluates every condition,
//! fires the matching rule with the highest salience, and repeats until no
//! condition holds.
//!
//! ```
//! use ruleforge::{DataContext, Engine, Record, RuleSet, Value};
//!
//! let rules = RuleSet::from_dsl(
//!     r#"rule "Adult" "" when user.Age >= 18 && user.Adult == false then user.Adult = true; end"#,
//! )?;
//! let user = Record::new("User").with("Age", 30_i64).with("Adult", false);
//! let data = DataContext::new().set("user", user.into_ref());
//!
//! let mut engine = Engine::new(&rules, data);
//! let result = engine.run();
//! assert_eq!(result.fired_rules(), ["Adult"]);
//! assert_eq!(engine.data().lookup("user.Adult")?, Value::Bool(true));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Host types take part by implementing [`HostObject`], usually through the
//! [`host_object!`] macro.

mod builder;
mod engine;
mod error;
mod evaluate;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use builder::{build, AstBuilder};
pub use engine::{Engine, EngineOptions, DEFAULT_MAX_CYCLES};
pub use error::RuleforgeError;
pub use evaluate::EvalContext;
pub use parse::{ConstantToken, ParseError, ParseTree, RuleListener};
pub use types::*;

#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};

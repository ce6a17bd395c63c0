use std::fmt;

use thiserror::Error;

use crate::parse::ParseError;
use crate::{BuildError, ErrorKind};

/// Unified error type covering parsing, building, facts loading, and I/O.
///
/// Returned by convenience methods like [`RuleSet::from_dsl()`](crate::RuleSet::from_dsl)
/// and [`RuleSet::from_file()`](crate::RuleSet::from_file).
#[derive(Debug, Error)]
pub enum RuleforgeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}", BuildErrors(.0))]
    Build(Vec<BuildError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid facts JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported facts: {0}")]
    Facts(#[from] ErrorKind),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}

impl From<Vec<BuildError>> for RuleforgeError {
    fn from(errors: Vec<BuildError>) -> Self {
        RuleforgeError::Build(errors)
    }
}

struct BuildErrors<'a>(&'a [BuildError]);

impl fmt::Display for BuildErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [] => f.write_str("build failed"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

mod error;
mod grammar;
mod listener;
mod parser;

pub use error::ParseError;
pub use listener::{ConstantToken, RuleListener};
pub use parser::ParseTree;

/// Parse DSL input into a [`ParseTree`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid DSL syntax.
pub fn parse(input: &str) -> Result<ParseTree, ParseError> {
    use winnow::Parser;
    grammar::parse_ruleset
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}

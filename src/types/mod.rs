mod action;
mod builtins;
mod context;
mod error;
mod expr;
mod host;
mod json;
mod rule;
mod ruleset;
mod run_result;
mod value;

pub use action::{AssignExpression, AssignExpressions, Assignment, ThenScope};
pub use builtins::BUILTINS_ROOT;
pub use context::DataContext;
pub use error::{BuildError, EngineError, ErrorKind, EvalError};
pub use expr::{
    call, lit, var, CompareOp, Constant, DataType, Expression, ExpressionAtom, FunctionArgument,
    FunctionCall, LogicalOp, MathOp, Operand, Predicate, Variable,
};
pub use host::{arg, expect_arity, HostObject, ObjectRef, Record};
pub use json::{value_from_json, value_to_json};
pub use rule::{RuleEntry, WhenScope};
pub use ruleset::{RuleSet, RuleSetBuilder};
pub use run_result::{
    RunResult, EXIT_BUILD_ERROR, EXIT_CANCELLED, EXIT_CYCLE_LIMIT, EXIT_OK, EXIT_RUNTIME_ERROR,
};
pub use value::{BaseKind, FromValue, Kind, Value};

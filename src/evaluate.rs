use crate::{
    AssignExpression, AssignExpressions, Assignment, CompareOp, Constant, DataContext, ErrorKind,
    EvalError, Expression, ExpressionAtom, FunctionCall, LogicalOp, Operand, Predicate, RuleEntry,
    ThenScope, Value, Variable, WhenScope,
};

/// What an evaluation can see: the data context rules read from and write to.
///
/// AST nodes hold no references to it; every `evaluate`/`execute` call
/// receives it explicitly.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    data: &'a DataContext,
}

impl<'a> EvalContext<'a> {
    #[must_use]
    pub fn new(data: &'a DataContext) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn data(&self) -> &'a DataContext {
        self.data
    }
}

fn truth(value: Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| {
        ErrorKind::mismatch(format!("condition produced {}, expected bool", value.kind())).into()
    })
}

fn is_not_null_marker(atom: &ExpressionAtom) -> bool {
    matches!(atom, ExpressionAtom::Constant(c) if c.is_not_null_marker())
}

// -- Value producers ----------------------------------------------------------

impl Constant {
    /// The literal as a runtime value.
    ///
    /// # Errors
    ///
    /// The `not null` marker has no value of its own and yields
    /// [`ErrorKind::TypeMismatch`] outside a comparison.
    pub fn evaluate(&self) -> Result<Value, EvalError> {
        Ok(match self {
            Constant::Decimal(v) => Value::Int(*v),
            Constant::Float(v) => Value::Float(*v),
            Constant::String(s) => Value::String(s.clone()),
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Null { is_null: true } => Value::Null,
            Constant::Null { is_null: false } => {
                return Err(ErrorKind::mismatch("'not null' is only valid as a comparison operand").into())
            }
        })
    }
}

impl Variable {
    /// # Errors
    ///
    /// Any [`DataContext::lookup`] error.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        Ok(ctx.data.lookup(self.path())?)
    }
}

impl FunctionCall {
    /// Evaluate the arguments left to right, then invoke the method.
    ///
    /// # Errors
    ///
    /// The first argument error, or the error the method returns.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        let args = self
            .arguments
            .arguments
            .iter()
            .enumerate()
            .map(|(i, arg)| arg.evaluate(ctx).map_err(|e| e.within(format!("arg[{i}]"))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ctx.data.invoke(self.method.path(), args)?)
    }
}

impl ExpressionAtom {
    /// # Errors
    ///
    /// Lookup, call or arithmetic errors, with the failing operand in the
    /// error path.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        match self {
            ExpressionAtom::Constant(c) => c.evaluate(),
            ExpressionAtom::Variable(v) => v.evaluate(ctx),
            ExpressionAtom::FunctionCall(call) => call.evaluate(ctx),
            ExpressionAtom::Math { left, op, right } => {
                let l = left.evaluate(ctx).map_err(|e| e.within("lhs"))?;
                let r = right.evaluate(ctx).map_err(|e| e.within("rhs"))?;
                Ok(l.calculate(*op, &r)?)
            }
        }
    }
}

// -- Conditions ---------------------------------------------------------------

impl Predicate {
    /// Evaluate the comparison, or the bare left atom when there is none.
    ///
    /// A `not null` operand turns the comparison into a nullness probe of
    /// the other side: `x == not null` holds when `x` is not null.
    ///
    /// # Errors
    ///
    /// Operand errors, or [`ErrorKind::TypeMismatch`] for incomparable kinds.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        let Some((op, right)) = &self.comparison else {
            return self.left.evaluate(ctx).map_err(|e| e.within("left"));
        };

        let probe = match (is_not_null_marker(&self.left), is_not_null_marker(right)) {
            (false, false) => None,
            (true, false) => Some((right, "right")),
            (false, true) => Some((&self.left, "left")),
            (true, true) => {
                return Err(ErrorKind::mismatch("'not null' on both sides of a comparison").into())
            }
        };
        if let Some((atom, side)) = probe {
            let value = atom.evaluate(ctx).map_err(|e| e.within(side))?;
            return match op {
                CompareOp::Eq => Ok(Value::Bool(!value.is_null())),
                CompareOp::Neq => Ok(Value::Bool(value.is_null())),
                _ => Err(ErrorKind::mismatch(format!("operator {op} is not defined on 'not null'")).into()),
            };
        }

        let l = self.left.evaluate(ctx).map_err(|e| e.within("left"))?;
        let r = right.evaluate(ctx).map_err(|e| e.within("right"))?;
        Ok(Value::Bool(l.compare(*op, &r)?))
    }
}

impl Operand {
    /// # Errors
    ///
    /// Errors from the predicate or grouped expression.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        match self {
            Operand::Predicate(p) => p.evaluate(ctx),
            Operand::Group(e) => e.evaluate(ctx).map_err(|err| err.within("group")),
        }
    }
}

impl Expression {
    /// Evaluate to `Value::Bool`.
    ///
    /// # Errors
    ///
    /// See [`Expression::test`].
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        self.test(ctx).map(Value::Bool)
    }

    /// Evaluate the operands left to right. `&&` skips its right side once
    /// the running value is false and `||` once it is true.
    ///
    /// # Errors
    ///
    /// The first operand error, or [`ErrorKind::TypeMismatch`] when an
    /// evaluated operand is not a boolean.
    pub fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let mut current = self
            .head
            .evaluate(ctx)
            .and_then(truth)
            .map_err(|e| e.within("expr[0]"))?;
        for (i, (op, next)) in self.tail.iter().enumerate() {
            let decided = match op {
                LogicalOp::And => !current,
                LogicalOp::Or => current,
            };
            if decided {
                continue;
            }
            current = next
                .test_operand(ctx)
                .map_err(|e| e.within(format!("expr[{}]", i + 1)))?;
        }
        Ok(current)
    }

    /// A tail entry holding a single operand is tested without an extra
    /// path segment.
    fn test_operand(&self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        if self.tail.is_empty() {
            self.head.evaluate(ctx).and_then(truth)
        } else {
            self.test(ctx)
        }
    }
}

impl WhenScope {
    /// # Errors
    ///
    /// See [`Expression::test`]; the path starts with `when`.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        self.expression.test(ctx).map_err(|e| e.within("when"))
    }
}

// -- Actions ------------------------------------------------------------------

impl Assignment {
    /// # Errors
    ///
    /// Source evaluation errors, or the data context's assignment error.
    pub fn execute(&self, ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        let value = self.source.evaluate(ctx).map_err(|e| e.within("source"))?;
        ctx.data
            .assign(self.target.path(), value)
            .map_err(|e| EvalError::from(e).within("target"))
    }
}

impl AssignExpression {
    /// # Errors
    ///
    /// Errors from the assignment or call.
    pub fn execute(&self, ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        match self {
            AssignExpression::Assignment(a) => a.execute(ctx),
            AssignExpression::Call(call) => call
                .evaluate(ctx)
                .map(drop)
                .map_err(|e| e.within("call")),
        }
    }
}

impl AssignExpressions {
    /// Run the statements in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// The first statement error, tagged with its index.
    pub fn execute(&self, ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        for (i, statement) in self.expressions.iter().enumerate() {
            statement
                .execute(ctx)
                .map_err(|e| e.within(format!("assign[{i}]")))?;
        }
        Ok(())
    }
}

impl ThenScope {
    /// # Errors
    ///
    /// See [`AssignExpressions::execute`]; the path starts with `then`.
    pub fn execute(&self, ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        self.assignments.execute(ctx).map_err(|e| e.within("then"))
    }
}

impl RuleEntry {
    /// Whether the rule's condition holds.
    ///
    /// # Errors
    ///
    /// Any condition evaluation error.
    pub fn matches(&self, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        self.when.evaluate(ctx)
    }

    /// Run the rule's action block.
    ///
    /// # Errors
    ///
    /// The first statement error.
    pub fn fire(&self, ctx: &EvalContext<'_>) -> Result<(), EvalError> {
        self.then.execute(ctx)
    }
}

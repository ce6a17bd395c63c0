use std::fmt;

use tracing::{debug, error};

use crate::parse::{ConstantToken, RuleListener};
use crate::{
    AssignExpression, AssignExpressions, Assignment, BuildError, CompareOp, Constant, Expression,
    ExpressionAtom, FunctionArgument, FunctionCall, LogicalOp, MathOp, Operand, Predicate,
    RuleEntry, RuleSet, ThenScope, Variable, WhenScope,
};

/// Parse DSL text and build it into a [`RuleSet`].
///
/// Returns every rule built before the first error together with the errors
/// reported. A clean build returns an empty error list.
pub fn build(input: &str) -> (RuleSet, Vec<BuildError>) {
    let tree = match crate::parse::parse(input) {
        Ok(tree) => tree,
        Err(e) => {
            error!(error = %e, "rule text failed to parse");
            return (RuleSet::default(), vec![BuildError::Syntax(e)]);
        }
    };
    let mut builder = AstBuilder::new();
    tree.walk(&mut builder);
    let (ruleset, errors) = builder.finish();
    if errors.is_empty() {
        debug!(rules = ruleset.len(), "rule set built");
    }
    (ruleset, errors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    RuleEntry,
    WhenScope,
    ThenScope,
    AssignExpressions,
    AssignExpression,
    Assignment,
    Expression,
    Predicate,
    ExpressionAtom,
    FunctionCall,
    FunctionArgs,
    Constant,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a frame refused a child node.
enum Refusal {
    /// The frame never holds this kind of child.
    NotHolder,
    /// The frame holds this kind of child but its slot is taken.
    Full(&'static str),
}

type Accept = Result<(), Refusal>;

fn fill<T>(slot: &mut Option<T>, value: T, full: &'static str) -> Accept {
    if slot.is_some() {
        return Err(Refusal::Full(full));
    }
    *slot = Some(value);
    Ok(())
}

#[derive(Debug, Default)]
struct RuleFrame {
    name: String,
    description: String,
    salience: i64,
    when: Option<WhenScope>,
    then: Option<ThenScope>,
}

impl RuleFrame {
    fn finish(self) -> Result<RuleEntry, &'static str> {
        Ok(RuleEntry {
            name: self.name,
            description: self.description,
            salience: self.salience,
            when: self.when.ok_or("rule without a when scope")?,
            then: self.then.ok_or("rule without a then scope")?,
        })
    }
}

#[derive(Debug, Default)]
struct ExpressionFrame {
    head: Option<Operand>,
    pending: Option<LogicalOp>,
    tail: Vec<(LogicalOp, Expression)>,
}

impl ExpressionFrame {
    fn accept_head(&mut self, operand: Operand) -> Accept {
        fill(&mut self.head, operand, "expression already has a head operand")
    }

    fn accept_child(&mut self, child: Expression) -> Accept {
        match self.pending.take() {
            Some(op) => {
                self.tail.push((op, child));
                Ok(())
            }
            None if self.head.is_none() => {
                self.head = Some(Operand::Group(Box::new(child)));
                Ok(())
            }
            None => Err(Refusal::Full("sub-expression without a logical operator")),
        }
    }

    fn accept_operator(&mut self, op: LogicalOp) -> Accept {
        if self.head.is_none() {
            return Err(Refusal::Full("logical operator before any operand"));
        }
        fill(&mut self.pending, op, "consecutive logical operators")
    }

    fn finish(self) -> Result<Expression, &'static str> {
        if self.pending.is_some() {
            return Err("logical operator without a right operand");
        }
        Ok(Expression {
            head: self.head.ok_or("expression without operands")?,
            tail: self.tail,
        })
    }
}

#[derive(Debug, Default)]
struct PredicateFrame {
    operands: Vec<ExpressionAtom>,
    op: Option<CompareOp>,
}

impl PredicateFrame {
    fn accept_operator(&mut self, op: CompareOp) -> Accept {
        if self.operands.len() != 1 {
            return Err(Refusal::Full("comparison operator must follow exactly one operand"));
        }
        fill(&mut self.op, op, "predicate already has a comparison operator")
    }

    fn finish(self) -> Result<Predicate, &'static str> {
        let PredicateFrame { operands, op } = self;
        let mut operands = operands.into_iter();
        let left = operands.next().ok_or("predicate without an operand")?;
        match (op, operands.next()) {
            (None, None) => Ok(Predicate {
                left,
                comparison: None,
            }),
            (Some(op), Some(right)) => Ok(Predicate {
                left,
                comparison: Some((op, right)),
            }),
            (Some(_), None) => Err("comparison without a right operand"),
            (None, Some(_)) => Err("two operands without a comparison operator"),
        }
    }
}

#[derive(Debug, Default)]
struct AtomFrame {
    leaf: Option<ExpressionAtom>,
    operands: Vec<ExpressionAtom>,
    op: Option<MathOp>,
}

impl AtomFrame {
    fn accept_leaf(&mut self, atom: ExpressionAtom) -> Accept {
        if !self.operands.is_empty() {
            return Err(Refusal::Full("expression atom already has operands"));
        }
        fill(&mut self.leaf, atom, "expression atom already has a value")
    }

    fn accept_operand(&mut self, atom: ExpressionAtom) -> Accept {
        if self.leaf.is_some() || self.operands.len() >= 2 {
            return Err(Refusal::Full("expression atom already has two operands"));
        }
        self.operands.push(atom);
        Ok(())
    }

    fn accept_operator(&mut self, op: MathOp) -> Accept {
        if self.leaf.is_some() || self.operands.len() != 1 {
            return Err(Refusal::Full("math operator must follow exactly one operand"));
        }
        fill(&mut self.op, op, "expression atom already has a math operator")
    }

    fn finish(self) -> Result<ExpressionAtom, &'static str> {
        let AtomFrame { leaf, operands, op } = self;
        if let Some(atom) = leaf {
            return Ok(atom);
        }
        let [left, right]: [ExpressionAtom; 2] = operands
            .try_into()
            .map_err(|_| "math expression needs exactly two operands")?;
        Ok(ExpressionAtom::Math {
            left: Box::new(left),
            op: op.ok_or("math expression without an operator")?,
            right: Box::new(right),
        })
    }
}

#[derive(Debug, Default)]
struct CallFrame {
    method: Option<Variable>,
    arguments: Option<FunctionArgument>,
}

#[derive(Debug, Default)]
struct AssignmentFrame {
    target: Option<Variable>,
    source: Option<ExpressionAtom>,
}

#[derive(Debug)]
enum Frame {
    RuleEntry(RuleFrame),
    WhenScope(Option<Expression>),
    ThenScope(Option<AssignExpressions>),
    AssignExpressions(Vec<AssignExpression>),
    AssignExpression(Option<AssignExpression>),
    Assignment(AssignmentFrame),
    Expression(ExpressionFrame),
    Predicate(PredicateFrame),
    ExpressionAtom(AtomFrame),
    FunctionCall(CallFrame),
    FunctionArgs(Vec<ExpressionAtom>),
    Constant(Option<Constant>),
}

// -- Holder contracts ---------------------------------------------------------

impl Frame {
    fn tag(&self) -> Tag {
        match self {
            Frame::RuleEntry(_) => Tag::RuleEntry,
            Frame::WhenScope(_) => Tag::WhenScope,
            Frame::ThenScope(_) => Tag::ThenScope,
            Frame::AssignExpressions(_) => Tag::AssignExpressions,
            Frame::AssignExpression(_) => Tag::AssignExpression,
            Frame::Assignment(_) => Tag::Assignment,
            Frame::Expression(_) => Tag::Expression,
            Frame::Predicate(_) => Tag::Predicate,
            Frame::ExpressionAtom(_) => Tag::ExpressionAtom,
            Frame::FunctionCall(_) => Tag::FunctionCall,
            Frame::FunctionArgs(_) => Tag::FunctionArgs,
            Frame::Constant(_) => Tag::Constant,
        }
    }

    fn accept_expression(&mut self, expression: Expression) -> Accept {
        match self {
            Frame::WhenScope(slot) => fill(slot, expression, "when scope already has a condition"),
            Frame::Expression(frame) => frame.accept_child(expression),
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_predicate(&mut self, predicate: Predicate) -> Accept {
        match self {
            Frame::Expression(frame) => frame.accept_head(Operand::Predicate(predicate)),
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_atom(&mut self, atom: ExpressionAtom) -> Accept {
        match self {
            Frame::Predicate(frame) => {
                if frame.operands.len() >= 2 {
                    return Err(Refusal::Full("predicate already has two operands"));
                }
                frame.operands.push(atom);
                Ok(())
            }
            Frame::ExpressionAtom(frame) => frame.accept_operand(atom),
            Frame::Assignment(frame) => {
                fill(&mut frame.source, atom, "assignment already has a source")
            }
            Frame::FunctionArgs(args) => {
                args.push(atom);
                Ok(())
            }
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_variable(&mut self, variable: Variable) -> Accept {
        match self {
            Frame::ExpressionAtom(frame) => frame.accept_leaf(ExpressionAtom::Variable(variable)),
            Frame::Assignment(frame) => {
                fill(&mut frame.target, variable, "assignment already has a target")
            }
            Frame::FunctionCall(frame) => {
                fill(&mut frame.method, variable, "function call already has a method")
            }
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_constant(&mut self, constant: Constant) -> Accept {
        match self {
            Frame::ExpressionAtom(frame) => frame.accept_leaf(ExpressionAtom::Constant(constant)),
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_function_call(&mut self, call: FunctionCall) -> Accept {
        match self {
            Frame::ExpressionAtom(frame) => frame.accept_leaf(ExpressionAtom::FunctionCall(call)),
            Frame::AssignExpression(slot) => {
                fill(slot, AssignExpression::Call(call), "statement already has a body")
            }
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_function_args(&mut self, arguments: FunctionArgument) -> Accept {
        match self {
            Frame::FunctionCall(frame) => fill(
                &mut frame.arguments,
                arguments,
                "function call already has arguments",
            ),
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_assignment(&mut self, assignment: Assignment) -> Accept {
        match self {
            Frame::AssignExpression(slot) => fill(
                slot,
                AssignExpression::Assignment(assignment),
                "statement already has a body",
            ),
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_assign_expression(&mut self, statement: AssignExpression) -> Accept {
        match self {
            Frame::AssignExpressions(statements) => {
                statements.push(statement);
                Ok(())
            }
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_assign_expressions(&mut self, statements: AssignExpressions) -> Accept {
        match self {
            Frame::ThenScope(slot) => fill(slot, statements, "then scope already has statements"),
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_when(&mut self, when: WhenScope) -> Accept {
        match self {
            Frame::RuleEntry(frame) => fill(&mut frame.when, when, "rule already has a when scope"),
            _ => Err(Refusal::NotHolder),
        }
    }

    fn accept_then(&mut self, then: ThenScope) -> Accept {
        match self {
            Frame::RuleEntry(frame) => fill(&mut frame.then, then, "rule already has a then scope"),
            _ => Err(Refusal::NotHolder),
        }
    }
}

// -- Builder ------------------------------------------------------------------

/// [`RuleListener`] that assembles parse events into a [`RuleSet`].
///
/// Each `enter_*` event pushes a frame and each `exit_*` event pops it, turns
/// it into an AST node and hands the node to the frame below. The first
/// error stops all construction: later events keep the stack balanced but
/// build nothing, and the rule being built is discarded.
#[derive(Debug, Default)]
pub struct AstBuilder {
    stack: Vec<Frame>,
    skipped: usize,
    ruleset: RuleSet,
    errors: Vec<BuildError>,
    rule: String,
}

impl AstBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors reported so far.
    #[must_use]
    pub fn errors(&self) -> &[BuildError] {
        &self.errors
    }

    /// Number of open frames, including those skipped after an error.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() + self.skipped
    }

    /// Return the rules built so far and every error reported.
    #[must_use]
    pub fn finish(mut self) -> (RuleSet, Vec<BuildError>) {
        if self.depth() != 0 {
            let open = self.depth();
            self.invariant(format!("{open} frame(s) still open at end of input"));
        }
        (self.ruleset, self.errors)
    }

    fn failed(&self) -> bool {
        !self.errors.is_empty()
    }

    fn record(&mut self, err: BuildError) {
        error!(error = %err, "rule build failed");
        self.errors.push(err);
    }

    fn malformed(&mut self, message: &str) {
        self.record(BuildError::Malformed {
            rule: self.rule.clone(),
            message: message.to_owned(),
        });
    }

    fn invariant(&mut self, message: String) {
        self.record(BuildError::BuilderInvariant { message });
    }

    fn unknown_operator(&mut self, token: &str) {
        if !self.failed() {
            self.record(BuildError::UnknownOperator {
                rule: self.rule.clone(),
                token: token.to_owned(),
            });
        }
    }

    fn invalid_literal(&mut self, token: &str, reason: String) {
        self.record(BuildError::InvalidLiteral {
            rule: self.rule.clone(),
            token: token.to_owned(),
            reason,
        });
    }

    fn push(&mut self, frame: Frame) {
        if self.failed() {
            self.skipped += 1;
        } else {
            self.stack.push(frame);
        }
    }

    /// Pop the top frame, which must carry `tag`. Returns `None` once any
    /// error has been reported.
    fn pop(&mut self, tag: Tag) -> Option<Frame> {
        if self.skipped > 0 {
            self.skipped -= 1;
            return None;
        }
        match self.stack.pop() {
            Some(frame) if frame.tag() == tag => {
                if self.failed() {
                    None
                } else {
                    Some(frame)
                }
            }
            Some(frame) => {
                let found = frame.tag();
                self.invariant(format!("exit {tag} found {found} on top of the stack"));
                None
            }
            None => {
                self.invariant(format!("exit {tag} with an empty stack"));
                None
            }
        }
    }

    fn close<T>(&mut self, built: Result<T, &'static str>) -> Option<T> {
        match built {
            Ok(node) => Some(node),
            Err(message) => {
                self.malformed(message);
                None
            }
        }
    }

    /// Hand a finished node or token to the frame on top of the stack.
    fn deliver(&mut self, child: &str, accept: impl FnOnce(&mut Frame) -> Accept) {
        if self.failed() {
            return;
        }
        let outcome = match self.stack.last_mut() {
            Some(parent) => accept(parent).map_err(|refusal| (Some(parent.tag()), refusal)),
            None => Err((None, Refusal::NotHolder)),
        };
        match outcome {
            Ok(()) => {}
            Err((_, Refusal::Full(message))) => self.malformed(message),
            Err((Some(parent), Refusal::NotHolder)) => {
                self.invariant(format!("{parent} frame cannot hold {child}"));
            }
            Err((None, Refusal::NotHolder)) => {
                self.invariant(format!("{child} arrived with an empty stack"));
            }
        }
    }

    fn set_literal(&mut self, constant: Constant) {
        self.deliver("a literal", |frame| match frame {
            Frame::Constant(slot) => fill(slot, constant, "constant already has a literal"),
            _ => Err(Refusal::NotHolder),
        });
    }
}

impl RuleListener for AstBuilder {
    fn enter_rule_entry(&mut self) {
        self.push(Frame::RuleEntry(RuleFrame::default()));
    }

    fn exit_rule_entry(&mut self) {
        let Some(Frame::RuleEntry(frame)) = self.pop(Tag::RuleEntry) else {
            return;
        };
        let Some(rule) = self.close(frame.finish()) else {
            return;
        };
        let name = rule.name.clone();
        match self.ruleset.insert(rule) {
            Ok(()) => debug!(rule = %name, "rule built"),
            Err(rejected) => self.record(BuildError::DuplicateRule {
                name: rejected.name,
            }),
        }
        self.rule.clear();
    }

    fn exit_rule_name(&mut self, text: &str) {
        self.deliver("a rule name", |frame| match frame {
            Frame::RuleEntry(rule) => {
                rule.name = text.to_owned();
                Ok(())
            }
            _ => Err(Refusal::NotHolder),
        });
        if !self.failed() {
            self.rule = text.to_owned();
        }
    }

    fn exit_rule_description(&mut self, text: &str) {
        self.deliver("a rule description", |frame| match frame {
            Frame::RuleEntry(rule) => {
                rule.description = text.to_owned();
                Ok(())
            }
            _ => Err(Refusal::NotHolder),
        });
    }

    fn exit_salience(&mut self, text: &str) {
        if self.failed() {
            return;
        }
        let salience = match text.parse::<i64>() {
            Ok(v) => v,
            Err(e) => return self.invalid_literal(text, e.to_string()),
        };
        self.deliver("a salience", |frame| match frame {
            Frame::RuleEntry(rule) => {
                rule.salience = salience;
                Ok(())
            }
            _ => Err(Refusal::NotHolder),
        });
    }

    fn enter_when_scope(&mut self) {
        self.push(Frame::WhenScope(None));
    }

    fn exit_when_scope(&mut self) {
        let Some(Frame::WhenScope(slot)) = self.pop(Tag::WhenScope) else {
            return;
        };
        let Some(expression) = self.close(slot.ok_or("when scope without a condition")) else {
            return;
        };
        self.deliver("a when scope", |frame| {
            frame.accept_when(WhenScope { expression })
        });
    }

    fn enter_then_scope(&mut self) {
        self.push(Frame::ThenScope(None));
    }

    fn exit_then_scope(&mut self) {
        let Some(Frame::ThenScope(slot)) = self.pop(Tag::ThenScope) else {
            return;
        };
        let Some(assignments) = self.close(slot.ok_or("then scope without statements")) else {
            return;
        };
        self.deliver("a then scope", |frame| {
            frame.accept_then(ThenScope { assignments })
        });
    }

    fn enter_assign_expressions(&mut self) {
        self.push(Frame::AssignExpressions(Vec::new()));
    }

    fn exit_assign_expressions(&mut self) {
        let Some(Frame::AssignExpressions(expressions)) = self.pop(Tag::AssignExpressions) else {
            return;
        };
        self.deliver("a statement list", |frame| {
            frame.accept_assign_expressions(AssignExpressions { expressions })
        });
    }

    fn enter_assign_expression(&mut self) {
        self.push(Frame::AssignExpression(None));
    }

    fn exit_assign_expression(&mut self) {
        let Some(Frame::AssignExpression(slot)) = self.pop(Tag::AssignExpression) else {
            return;
        };
        let Some(statement) = self.close(slot.ok_or("empty statement")) else {
            return;
        };
        self.deliver("a statement", |frame| {
            frame.accept_assign_expression(statement)
        });
    }

    fn enter_assignment(&mut self) {
        self.push(Frame::Assignment(AssignmentFrame::default()));
    }

    fn exit_assignment(&mut self) {
        let Some(Frame::Assignment(frame)) = self.pop(Tag::Assignment) else {
            return;
        };
        let built = match (frame.target, frame.source) {
            (Some(target), Some(source)) => Ok(Assignment { target, source }),
            (None, _) => Err("assignment without a target"),
            (_, None) => Err("assignment without a source"),
        };
        let Some(assignment) = self.close(built) else {
            return;
        };
        self.deliver("an assignment", |frame| frame.accept_assignment(assignment));
    }

    fn enter_expression(&mut self) {
        self.push(Frame::Expression(ExpressionFrame::default()));
    }

    fn exit_expression(&mut self) {
        let Some(Frame::Expression(frame)) = self.pop(Tag::Expression) else {
            return;
        };
        let Some(expression) = self.close(frame.finish()) else {
            return;
        };
        self.deliver("an expression", |frame| frame.accept_expression(expression));
    }

    fn enter_predicate(&mut self) {
        self.push(Frame::Predicate(PredicateFrame::default()));
    }

    fn exit_predicate(&mut self) {
        let Some(Frame::Predicate(frame)) = self.pop(Tag::Predicate) else {
            return;
        };
        let Some(predicate) = self.close(frame.finish()) else {
            return;
        };
        self.deliver("a predicate", |frame| frame.accept_predicate(predicate));
    }

    fn enter_expression_atom(&mut self) {
        self.push(Frame::ExpressionAtom(AtomFrame::default()));
    }

    fn exit_expression_atom(&mut self) {
        let Some(Frame::ExpressionAtom(frame)) = self.pop(Tag::ExpressionAtom) else {
            return;
        };
        let Some(atom) = self.close(frame.finish()) else {
            return;
        };
        self.deliver("an expression atom", |frame| frame.accept_atom(atom));
    }

    fn enter_function_call(&mut self) {
        self.push(Frame::FunctionCall(CallFrame::default()));
    }

    fn exit_function_call(&mut self) {
        let Some(Frame::FunctionCall(frame)) = self.pop(Tag::FunctionCall) else {
            return;
        };
        let Some(method) = self.close(frame.method.ok_or("function call without a method")) else {
            return;
        };
        let call = FunctionCall {
            method,
            arguments: frame.arguments.unwrap_or_default(),
        };
        self.deliver("a function call", |frame| frame.accept_function_call(call));
    }

    fn enter_function_args(&mut self) {
        self.push(Frame::FunctionArgs(Vec::new()));
    }

    fn exit_function_args(&mut self) {
        let Some(Frame::FunctionArgs(arguments)) = self.pop(Tag::FunctionArgs) else {
            return;
        };
        self.deliver("function arguments", |frame| {
            frame.accept_function_args(FunctionArgument { arguments })
        });
    }

    fn enter_constant(&mut self) {
        self.push(Frame::Constant(None));
    }

    fn exit_constant(&mut self, token: &ConstantToken<'_>) {
        let Some(Frame::Constant(literal)) = self.pop(Tag::Constant) else {
            return;
        };
        let constant = if token.real {
            match token.text.parse::<f64>() {
                Ok(v) => Constant::Float(v),
                Err(e) => return self.invalid_literal(token.text, e.to_string()),
            }
        } else if token.null {
            Constant::Null {
                is_null: !token.not,
            }
        } else {
            match literal {
                Some(Constant::Decimal(v)) if token.text.starts_with('-') => Constant::Decimal(-v),
                Some(constant) => constant,
                None => return self.malformed("constant without a literal"),
            }
        };
        self.deliver("a constant", |frame| frame.accept_constant(constant));
    }

    fn exit_variable(&mut self, text: &str) {
        self.deliver("a variable", |frame| {
            frame.accept_variable(Variable::new(text))
        });
    }

    fn exit_logical_operator(&mut self, text: &str) {
        let Some(op) = LogicalOp::from_token(text) else {
            return self.unknown_operator(text);
        };
        self.deliver("a logical operator", |frame| match frame {
            Frame::Expression(expression) => expression.accept_operator(op),
            _ => Err(Refusal::NotHolder),
        });
    }

    fn exit_math_operator(&mut self, text: &str) {
        let Some(op) = MathOp::from_token(text) else {
            return self.unknown_operator(text);
        };
        self.deliver("a math operator", |frame| match frame {
            Frame::ExpressionAtom(atom) => atom.accept_operator(op),
            _ => Err(Refusal::NotHolder),
        });
    }

    fn exit_comparison_operator(&mut self, text: &str) {
        let Some(op) = CompareOp::from_token(text) else {
            return self.unknown_operator(text);
        };
        self.deliver("a comparison operator", |frame| match frame {
            Frame::Predicate(predicate) => predicate.accept_operator(op),
            _ => Err(Refusal::NotHolder),
        });
    }

    fn exit_decimal_literal(&mut self, text: &str) {
        if self.failed() {
            return;
        }
        let digits = text.trim_start_matches('-');
        match digits.parse::<i64>() {
            Ok(v) => self.set_literal(Constant::Decimal(v)),
            Err(e) => self.invalid_literal(text, e.to_string()),
        }
    }

    fn exit_string_literal(&mut self, text: &str) {
        self.set_literal(Constant::String(text.to_owned()));
    }

    fn exit_boolean_literal(&mut self, text: &str) {
        if self.failed() {
            return;
        }
        match text.to_ascii_lowercase().as_str() {
            "true" => self.set_literal(Constant::Bool(true)),
            "false" => self.set_literal(Constant::Bool(false)),
            _ => self.invalid_literal(text, "expected true or false".to_owned()),
        }
    }
}

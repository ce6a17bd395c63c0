use super::listener::{ConstantToken, RuleListener};

/// Concrete syntax tree produced by [`parse`](super::parse).
///
/// Holds operator and literal text exactly as written; interpretation is left
/// to the [`RuleListener`] that walks it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    pub(crate) rules: Vec<RuleNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RuleNode {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) salience: Option<String>,
    pub(crate) when: ExpressionNode,
    pub(crate) then: Vec<StatementNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StatementNode {
    Assign { target: String, source: AtomNode },
    Call(CallNode),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExpressionNode {
    pub(crate) head: TermNode,
    pub(crate) tail: Vec<(String, TermNode)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TermNode {
    Predicate(PredicateNode),
    Group(Box<ExpressionNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PredicateNode {
    pub(crate) left: AtomNode,
    pub(crate) comparison: Option<(String, AtomNode)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AtomNode {
    Constant(ConstantNode),
    Variable(String),
    Call(CallNode),
    Math(Box<AtomNode>, String, Box<AtomNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CallNode {
    pub(crate) path: String,
    pub(crate) args: Vec<AtomNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConstantNode {
    pub(crate) text: String,
    pub(crate) literal: LiteralNode,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LiteralNode {
    /// Unsigned digits of an integer literal.
    Decimal(String),
    Real,
    Str(String),
    Bool(String),
    Null { negated: bool },
}

impl ConstantNode {
    pub(crate) fn string(value: String) -> Self {
        Self {
            text: value.clone(),
            literal: LiteralNode::Str(value),
        }
    }

    pub(crate) fn boolean(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            literal: LiteralNode::Bool(text.to_owned()),
        }
    }

    pub(crate) fn null(negated: bool) -> Self {
        let text = if negated { "not null" } else { "null" };
        Self {
            text: text.to_owned(),
            literal: LiteralNode::Null { negated },
        }
    }
}

impl ParseTree {
    /// Number of rule definitions in the tree.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Replay the tree as listener events, rules in source order.
    pub fn walk<L: RuleListener + ?Sized>(&self, listener: &mut L) {
        for rule in &self.rules {
            rule.walk(listener);
        }
    }
}

impl RuleNode {
    fn walk<L: RuleListener + ?Sized>(&self, l: &mut L) {
        l.enter_rule_entry();
        l.exit_rule_name(&self.name);
        l.exit_rule_description(&self.description);
        if let Some(salience) = &self.salience {
            l.exit_salience(salience);
        }

        l.enter_when_scope();
        self.when.walk(l);
        l.exit_when_scope();

        l.enter_then_scope();
        l.enter_assign_expressions();
        for statement in &self.then {
            l.enter_assign_expression();
            statement.walk(l);
            l.exit_assign_expression();
        }
        l.exit_assign_expressions();
        l.exit_then_scope();

        l.exit_rule_entry();
    }
}

impl StatementNode {
    fn walk<L: RuleListener + ?Sized>(&self, l: &mut L) {
        match self {
            StatementNode::Assign { target, source } => {
                l.enter_assignment();
                l.exit_variable(target);
                source.walk(l);
                l.exit_assignment();
            }
            StatementNode::Call(call) => call.walk(l),
        }
    }
}

impl ExpressionNode {
    fn walk<L: RuleListener + ?Sized>(&self, l: &mut L) {
        l.enter_expression();
        self.head.walk(l);
        for (op, term) in &self.tail {
            l.exit_logical_operator(op);
            l.enter_expression();
            term.walk(l);
            l.exit_expression();
        }
        l.exit_expression();
    }
}

impl TermNode {
    fn walk<L: RuleListener + ?Sized>(&self, l: &mut L) {
        match self {
            TermNode::Predicate(p) => p.walk(l),
            TermNode::Group(e) => e.walk(l),
        }
    }
}

impl PredicateNode {
    fn walk<L: RuleListener + ?Sized>(&self, l: &mut L) {
        l.enter_predicate();
        self.left.walk(l);
        if let Some((op, right)) = &self.comparison {
            l.exit_comparison_operator(op);
            right.walk(l);
        }
        l.exit_predicate();
    }
}

impl AtomNode {
    fn walk<L: RuleListener + ?Sized>(&self, l: &mut L) {
        l.enter_expression_atom();
        match self {
            AtomNode::Constant(c) => c.walk(l),
            AtomNode::Variable(path) => l.exit_variable(path),
            AtomNode::Call(call) => call.walk(l),
            AtomNode::Math(left, op, right) => {
                left.walk(l);
                l.exit_math_operator(op);
                right.walk(l);
            }
        }
        l.exit_expression_atom();
    }
}

impl CallNode {
    fn walk<L: RuleListener + ?Sized>(&self, l: &mut L) {
        l.enter_function_call();
        l.exit_variable(&self.path);
        l.enter_function_args();
        for arg in &self.args {
            arg.walk(l);
        }
        l.exit_function_args();
        l.exit_function_call();
    }
}

impl ConstantNode {
    fn walk<L: RuleListener + ?Sized>(&self, l: &mut L) {
        l.enter_constant();
        let mut token = ConstantToken {
            text: &self.text,
            real: false,
            null: false,
            not: false,
        };
        match &self.literal {
            LiteralNode::Decimal(digits) => l.exit_decimal_literal(digits),
            LiteralNode::Real => token.real = true,
            LiteralNode::Str(s) => l.exit_string_literal(s),
            LiteralNode::Bool(b) => l.exit_boolean_literal(b),
            LiteralNode::Null { negated } => {
                token.null = true;
                token.not = *negated;
            }
        }
        l.exit_constant(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    /// Records the event stream as compact strings.
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Trace {
        fn push(&mut self, event: impl Into<String>) {
            self.0.push(event.into());
        }
    }

    impl RuleListener for Trace {
        fn enter_rule_entry(&mut self) {
            self.push("+rule");
        }
        fn exit_rule_entry(&mut self) {
            self.push("-rule");
        }
        fn exit_rule_name(&mut self, text: &str) {
            self.push(format!("name:{text}"));
        }
        fn exit_rule_description(&mut self, _text: &str) {}
        fn exit_salience(&mut self, text: &str) {
            self.push(format!("salience:{text}"));
        }
        fn enter_when_scope(&mut self) {
            self.push("+when");
        }
        fn exit_when_scope(&mut self) {
            self.push("-when");
        }
        fn enter_then_scope(&mut self) {
            self.push("+then");
        }
        fn exit_then_scope(&mut self) {
            self.push("-then");
        }
        fn enter_assign_expressions(&mut self) {}
        fn exit_assign_expressions(&mut self) {}
        fn enter_assign_expression(&mut self) {}
        fn exit_assign_expression(&mut self) {}
        fn enter_assignment(&mut self) {
            self.push("+assign");
        }
        fn exit_assignment(&mut self) {
            self.push("-assign");
        }
        fn enter_expression(&mut self) {
            self.push("+expr");
        }
        fn exit_expression(&mut self) {
            self.push("-expr");
        }
        fn enter_predicate(&mut self) {
            self.push("+pred");
        }
        fn exit_predicate(&mut self) {
            self.push("-pred");
        }
        fn enter_expression_atom(&mut self) {}
        fn exit_expression_atom(&mut self) {}
        fn enter_function_call(&mut self) {
            self.push("+call");
        }
        fn exit_function_call(&mut self) {
            self.push("-call");
        }
        fn enter_function_args(&mut self) {}
        fn exit_function_args(&mut self) {}
        fn enter_constant(&mut self) {}
        fn exit_constant(&mut self, token: &ConstantToken<'_>) {
            self.push(format!("const:{}", token.text));
        }
        fn exit_variable(&mut self, text: &str) {
            self.push(format!("var:{text}"));
        }
        fn exit_logical_operator(&mut self, text: &str) {
            self.push(format!("logic:{text}"));
        }
        fn exit_math_operator(&mut self, text: &str) {
            self.push(format!("math:{text}"));
        }
        fn exit_comparison_operator(&mut self, text: &str) {
            self.push(format!("cmp:{text}"));
        }
        fn exit_decimal_literal(&mut self, text: &str) {
            self.push(format!("dec:{text}"));
        }
        fn exit_string_literal(&mut self, _text: &str) {}
        fn exit_boolean_literal(&mut self, _text: &str) {}
    }

    #[test]
    fn tail_terms_are_wrapped_in_expressions() {
        let tree = parse("rule r \"\" salience 2 when a.X > -1 || a.Y then a.Z = 1; end").unwrap();
        let mut trace = Trace::default();
        tree.walk(&mut trace);
        assert_eq!(
            trace.0,
            vec![
                "+rule", "name:r", "salience:2", "+when", "+expr", "+pred", "var:a.X",
                "cmp:>", "dec:1", "const:-1", "-pred", "logic:||", "+expr", "+pred",
                "var:a.Y", "-pred", "-expr", "-expr", "-when", "+then", "+assign", "var:a.Z",
                "dec:1", "const:1", "-assign", "-then", "-rule",
            ]
        );
    }

    #[test]
    fn calls_emit_path_then_arguments() {
        let tree = parse("rule r \"\" when x.A then Retract(); end").unwrap();
        let mut trace = Trace::default();
        tree.walk(&mut trace);
        let then_start = trace.0.iter().position(|e| e == "+then").unwrap();
        assert_eq!(
            &trace.0[then_start..],
            &["+then", "+call", "var:Retract", "-call", "-then", "-rule"]
        );
        assert_eq!(tree.rule_count(), 1);
    }
}

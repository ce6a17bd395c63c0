/// The text of a constant being exited, with the flags needed to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantToken<'a> {
    /// Full source text, including a leading `-` for negative numbers.
    pub text: &'a str,
    /// The constant is a real (floating-point) literal.
    pub real: bool,
    /// The constant is `null` or `not null`.
    pub null: bool,
    /// The `not` keyword preceded `null`.
    pub not: bool,
}

/// Receives parse events in source order.
///
/// [`ParseTree::walk`](super::ParseTree::walk) drives a listener with nested
/// `enter_*` / `exit_*` pairs for every node and single `exit_*` calls for
/// terminal tokens. [`AstBuilder`](crate::AstBuilder) is the listener that
/// assembles a [`RuleSet`](crate::RuleSet); other implementations can wrap it
/// to observe or rewrite the event stream.
pub trait RuleListener {
    fn enter_rule_entry(&mut self);
    fn exit_rule_entry(&mut self);
    fn exit_rule_name(&mut self, text: &str);
    fn exit_rule_description(&mut self, text: &str);
    fn exit_salience(&mut self, text: &str);

    fn enter_when_scope(&mut self);
    fn exit_when_scope(&mut self);
    fn enter_then_scope(&mut self);
    fn exit_then_scope(&mut self);

    fn enter_assign_expressions(&mut self);
    fn exit_assign_expressions(&mut self);
    fn enter_assign_expression(&mut self);
    fn exit_assign_expression(&mut self);
    fn enter_assignment(&mut self);
    fn exit_assignment(&mut self);

    fn enter_expression(&mut self);
    fn exit_expression(&mut self);
    fn enter_predicate(&mut self);
    fn exit_predicate(&mut self);
    fn enter_expression_atom(&mut self);
    fn exit_expression_atom(&mut self);
    fn enter_function_call(&mut self);
    fn exit_function_call(&mut self);
    fn enter_function_args(&mut self);
    fn exit_function_args(&mut self);
    fn enter_constant(&mut self);
    fn exit_constant(&mut self, token: &ConstantToken<'_>);

    fn exit_variable(&mut self, text: &str);
    fn exit_logical_operator(&mut self, text: &str);
    fn exit_math_operator(&mut self, text: &str);
    fn exit_comparison_operator(&mut self, text: &str);
    /// Unsigned digits; the sign is carried by [`ConstantToken::text`].
    fn exit_decimal_literal(&mut self, text: &str);
    fn exit_string_literal(&mut self, text: &str);
    fn exit_boolean_literal(&mut self, text: &str);
}

use ruleforge::{
    build, parse::parse, AstBuilder, BuildError, ConstantToken, DataContext, Engine, ErrorKind,
    EngineError, Record, RuleListener, RuleSet, RuleforgeError, Value,
};

fn run_one(rule: &str, data: DataContext) -> (ruleforge::RunResult, DataContext) {
    let rs = RuleSet::from_dsl(rule).unwrap();
    let mut engine = Engine::new(&rs, data);
    let result = engine.run();
    (result, engine.into_data())
}

fn scratch() -> DataContext {
    DataContext::new().set(
        "s",
        Record::new("Scratch")
            .with("Text", "")
            .with("Num", 0_i64)
            .with("Real", 0.0)
            .with("Done", false)
            .into_ref(),
    )
}

// ---------------------------------------------------------------------------
// Boundary behaviors
// ---------------------------------------------------------------------------

#[test]
fn largest_decimal_literal_builds() {
    let (rs, errors) = build("rule R \"\" when s.Num < 9223372036854775807 then s.Done = true; end");
    assert!(errors.is_empty());
    assert_eq!(rs.len(), 1);
}

#[test]
fn decimal_literal_overflow_is_a_build_error() {
    let (rs, errors) = build("rule R \"\" when s.Num < 9223372036854775808 then s.Done = true; end");
    assert!(rs.is_empty());
    assert!(matches!(
        errors.as_slice(),
        [BuildError::InvalidLiteral { rule, .. }] if rule == "R"
    ));
}

#[test]
fn string_concatenation_in_actions() {
    let (result, data) = run_one(
        r#"rule R "" when s.Done == false then s.Text = "foo" + 3 + "|" + (3 + "foo"); s.Done = true; end"#,
        scratch(),
    );
    assert!(result.is_ok());
    assert_eq!(data.lookup("s.Text").unwrap(), Value::from("foo3|3foo"));
}

#[test]
fn string_subtraction_is_a_runtime_error() {
    let (result, _) = run_one(
        r#"rule R "" when s.Done == false then s.Text = "foo" - "bar"; end"#,
        scratch(),
    );
    let Some(EngineError::Action { rule, source }) = result.error() else {
        panic!("expected an action error, got {:?}", result.error());
    };
    assert_eq!(rule, "R");
    assert!(matches!(source.kind(), ErrorKind::TypeMismatch(_)));
    assert_eq!(source.node_path(), "then.assign[0].source");
    assert_eq!(result.exit_code(), ruleforge::EXIT_RUNTIME_ERROR);
}

#[test]
fn integer_division_by_zero() {
    let (result, _) = run_one(
        r#"rule R "" when s.Done == false then s.Num = 10 / s.Num; end"#,
        scratch(),
    );
    let Some(EngineError::Action { source, .. }) = result.error() else {
        panic!("expected an action error");
    };
    assert_eq!(source.kind(), &ErrorKind::DivideByZero);
}

#[test]
fn null_literals() {
    let (result, _) = run_one(
        r#"rule R "" when null == null && s == not null && (null != null || s.Done == false)
           then s.Done = true; end"#,
        scratch(),
    );
    assert!(result.is_ok(), "{:?}", result.error());
    assert_eq!(result.fired_rules(), ["R"]);
}

#[test]
fn math_precedence_and_parentheses() {
    let (_, data) = run_one(
        r#"rule R "" when s.Done == false then s.Num = 2 + 3 * 4 - (1 + 1) * 2; s.Real = 7 / 2.0; s.Done = true; end"#,
        scratch(),
    );
    assert_eq!(data.lookup("s.Num").unwrap(), Value::Int(10));
    assert_eq!(data.lookup("s.Real").unwrap(), Value::Float(3.5));
}

#[test]
fn comments_and_optional_description() {
    let rs = RuleSet::from_dsl(
        r"
        # a comment
        rule First when s.Num == 0 then s.Num = 1; end   // trailing comment
        rule Second salience 3 when s.Num == 1 then s.Num = 2; end
        ",
    )
    .unwrap();
    assert_eq!(rs.names(), vec!["First", "Second"]);
    assert_eq!(rs.get("First").unwrap().description, "");
    assert_eq!(rs.get("Second").unwrap().salience, 3);
}

#[test]
fn builtins_are_callable_bare_and_qualified() {
    let (result, data) = run_one(
        r#"rule R "" when s.Done == false && IsZero(s.Num) && DEFUNC.Len("abc") == 3
           then s.Num = Max(4, s.Num); s.Real = Min(1.5, 2); Log("fired " + s.Num); s.Done = true; end"#,
        scratch(),
    );
    assert!(result.is_ok(), "{:?}", result.error());
    assert_eq!(data.lookup("s.Num").unwrap(), Value::Int(4));
    assert_eq!(data.lookup("s.Real").unwrap(), Value::Float(1.5));
}

#[test]
fn syntax_errors_surface_from_from_dsl() {
    let err = RuleSet::from_dsl("rule R \"\" when s.Num == then s.Done = true; end").unwrap_err();
    assert!(matches!(err, RuleforgeError::Parse(_)));
    assert!(err.to_string().starts_with("parse error"));
}

#[test]
fn display_round_trips_through_the_parser() {
    let source = r#"
        rule "Mixed" "all the node kinds" salience -2
        when (a.X > 1 || a.Y <= 2.5) && a.Z != null && a.W == not null && a.Flag
        then a.X = a.X * (a.Y + 1); DEFUNC.Retract(); end
    "#;
    let rs = RuleSet::from_dsl(source).unwrap();
    let printed = rs.to_string();
    let reparsed = RuleSet::from_dsl(&printed).unwrap();
    assert_eq!(reparsed, rs, "printed form:\n{printed}");
}

// ---------------------------------------------------------------------------
// Custom listeners
// ---------------------------------------------------------------------------

/// Forwards every event to an `AstBuilder`, rewriting comparison operators.
struct Rewriter {
    inner: AstBuilder,
    from: &'static str,
    to: &'static str,
}

macro_rules! forward {
    ($($name:ident),* $(,)?) => {
        $(fn $name(&mut self) { self.inner.$name(); })*
    };
}

macro_rules! forward_text {
    ($($name:ident),* $(,)?) => {
        $(fn $name(&mut self, text: &str) { self.inner.$name(text); })*
    };
}

impl RuleListener for Rewriter {
    forward!(
        enter_rule_entry,
        exit_rule_entry,
        enter_when_scope,
        exit_when_scope,
        enter_then_scope,
        exit_then_scope,
        enter_assign_expressions,
        exit_assign_expressions,
        enter_assign_expression,
        exit_assign_expression,
        enter_assignment,
        exit_assignment,
        enter_expression,
        exit_expression,
        enter_predicate,
        exit_predicate,
        enter_expression_atom,
        exit_expression_atom,
        enter_function_call,
        exit_function_call,
        enter_function_args,
        exit_function_args,
        enter_constant,
    );

    forward_text!(
        exit_rule_name,
        exit_rule_description,
        exit_salience,
        exit_variable,
        exit_logical_operator,
        exit_math_operator,
        exit_decimal_literal,
        exit_string_literal,
        exit_boolean_literal,
    );

    fn exit_constant(&mut self, token: &ConstantToken<'_>) {
        self.inner.exit_constant(token);
    }

    fn exit_comparison_operator(&mut self, text: &str) {
        let text = if text == self.from { self.to } else { text };
        self.inner.exit_comparison_operator(text);
    }
}

fn rewrite(source: &str, from: &'static str, to: &'static str) -> (RuleSet, Vec<BuildError>) {
    let tree = parse(source).unwrap();
    let mut listener = Rewriter {
        inner: AstBuilder::new(),
        from,
        to,
    };
    tree.walk(&mut listener);
    listener.inner.finish()
}

#[test]
fn rewritten_operator_is_accepted() {
    let (rs, errors) = rewrite("rule R \"\" when a.B < 1 then a.C = 1; end", "<", ">=");
    assert!(errors.is_empty());
    assert_eq!(
        rs.get("R").unwrap().to_string(),
        r#"rule "R" "" salience 0 when a.B >= 1 then a.C = 1; end"#
    );
}

#[test]
fn unknown_operator_from_listener() {
    let source = "rule R \"\" when a.B < 1 then a.C = 1; end
                  rule S \"\" when a.B == 1 then a.C = 1; end";
    let (rs, errors) = rewrite(source, "<", "=<");
    assert_eq!(
        errors,
        vec![BuildError::UnknownOperator {
            rule: "R".into(),
            token: "=<".into()
        }]
    );
    assert!(rs.is_empty(), "construction stops at the first error");
}

#[test]
fn builder_reports_stack_depth() {
    let tree = parse("rule R \"\" when a.B then a.C = 1; end").unwrap();
    let mut builder = AstBuilder::new();
    builder.enter_rule_entry();
    assert_eq!(builder.depth(), 1);
    builder.exit_rule_entry();
    tree.walk(&mut builder);
    assert_eq!(builder.depth(), 0);
    let (_, errors) = builder.finish();
    assert!(matches!(
        errors.as_slice(),
        [BuildError::Malformed { .. }]
    ));
}

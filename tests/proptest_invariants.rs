use proptest::prelude::*;
use ruleforge::{
    build, lit, parse::parse, var, AstBuilder, BuildError, CompareOp, DataContext, EvalContext,
    Expression, ExpressionAtom, Predicate, Record, RuleEntry, RuleListener, RuleSet,
    RuleSetBuilder, ThenScope, Value,
};

fn arb_number() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1_000_000_i64..1_000_000).prop_map(Value::Int),
        (0_u64..2_000_000).prop_map(Value::Uint),
        (-1.0e6_f64..1.0e6).prop_map(Value::Float),
    ]
}

fn arb_ordering_op() -> impl Strategy<Value = CompareOp> {
    prop_oneof![
        Just(CompareOp::Lt),
        Just(CompareOp::Lte),
        Just(CompareOp::Gt),
        Just(CompareOp::Gte),
    ]
}

fn arb_any_op() -> impl Strategy<Value = CompareOp> {
    prop_oneof![
        Just(CompareOp::Eq),
        Just(CompareOp::Neq),
        arb_ordering_op(),
    ]
}

fn complement(op: CompareOp) -> CompareOp {
    match op {
        CompareOp::Eq => CompareOp::Neq,
        CompareOp::Neq => CompareOp::Eq,
        CompareOp::Lt => CompareOp::Gte,
        CompareOp::Lte => CompareOp::Gt,
        CompareOp::Gt => CompareOp::Lte,
        CompareOp::Gte => CompareOp::Lt,
    }
}

fn facts(l: Value, r: Value) -> DataContext {
    DataContext::new().set(
        "f",
        Record::new("F")
            .with("L", l)
            .with("R", r)
            .with("B", true)
            .into_ref(),
    )
}

fn holds(predicate: Predicate, data: &DataContext) -> bool {
    Expression::from(predicate)
        .test(&EvalContext::new(data))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Ordering duality
//
// For numeric operands, `l op r` is the negation of `l !op r`, and agrees
// with `r op' l` for the mirrored operator.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn complement_negates(l in arb_number(), r in arb_number(), op in arb_ordering_op()) {
        let data = facts(l, r);
        let direct = holds(var("f.L").compare(op, var("f.R")), &data);
        let negated = holds(var("f.L").compare(complement(op), var("f.R")), &data);
        prop_assert_eq!(direct, !negated);
    }

    #[test]
    fn swapping_operands_mirrors_the_operator(
        l in arb_number(),
        r in arb_number(),
        op in arb_any_op(),
    ) {
        let data = facts(l, r);
        let direct = holds(var("f.L").compare(op, var("f.R")), &data);
        let mirrored = holds(var("f.R").compare(op.swapped(), var("f.L")), &data);
        prop_assert_eq!(direct, mirrored);
    }
}

// ---------------------------------------------------------------------------
// Condition purity
//
// Evaluating the same condition twice on unchanged data gives the same value.
// ---------------------------------------------------------------------------

fn arb_atom() -> impl Strategy<Value = ExpressionAtom> {
    prop_oneof![
        Just(var("f.L")),
        Just(var("f.R")),
        (-100_i64..100).prop_map(|v| lit(v)),
        Just(var("f.L").plus(var("f.R"))),
        Just(var("f.R").times(lit(2_i64))),
    ]
}

fn arb_condition() -> impl Strategy<Value = Expression> {
    let predicate = prop_oneof![
        4 => (arb_atom(), arb_any_op(), arb_atom())
            .prop_map(|(l, op, r)| Expression::from(l.compare(op, r))),
        1 => Just(Expression::from(Predicate::truth(var("f.B")))),
    ];
    predicate.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(b)),
            inner.prop_map(Expression::group),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn conditions_are_pure(cond in arb_condition(), l in arb_number(), r in arb_number()) {
        let data = facts(l, r);
        let ctx = EvalContext::new(&data);
        let first = cond.evaluate(&ctx);
        let second = cond.evaluate(&ctx);
        prop_assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Assignment round-trip
//
// Writing a value to a field and reading it back yields the written value,
// modulo widening into the field's existing kind.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn int_field_round_trip(v in any::<i64>()) {
        let data = facts(Value::Int(0), Value::Null);
        data.assign("f.L", Value::Int(v)).unwrap();
        prop_assert_eq!(data.lookup("f.L").unwrap(), Value::Int(v));
    }

    #[test]
    fn float_field_widens_integers(v in -1_000_000_i64..1_000_000) {
        let data = facts(Value::Float(0.0), Value::Null);
        data.assign("f.L", Value::Int(v)).unwrap();
        prop_assert_eq!(data.lookup("f.L").unwrap(), Value::Float(v as f64));
    }

    #[test]
    fn string_field_round_trip(s in "[a-zA-Z0-9 ]{0,24}") {
        let data = facts(Value::from(""), Value::Null);
        data.assign("f.L", Value::from(s.as_str())).unwrap();
        prop_assert_eq!(data.lookup("f.L").unwrap(), Value::from(s));
    }

    #[test]
    fn null_field_accepts_anything(v in arb_number()) {
        let data = facts(Value::Int(0), Value::Null);
        data.assign("f.R", v.clone()).unwrap();
        prop_assert_eq!(data.lookup("f.R").unwrap(), v);
    }
}

// ---------------------------------------------------------------------------
// Builder stack balance
//
// Every walk leaves the builder with an empty stack, or reports a
// `BuilderInvariant`.
// ---------------------------------------------------------------------------

fn arb_rule_text() -> impl Strategy<Value = String> {
    let op = prop_oneof![
        Just("=="),
        Just("!="),
        Just("<"),
        Just("<="),
        Just(">"),
        Just(">="),
    ];
    let logic = prop_oneof![Just("&&"), Just("||")];
    let term = (op, -50_i64..50).prop_map(|(op, n)| format!("f.L {op} {n}"));
    (
        prop::collection::vec(term, 1..4),
        prop::collection::vec(logic, 3),
        prop::bool::ANY,
        -5_i64..5,
    )
        .prop_map(|(terms, logic, grouped, salience)| {
            let mut when = terms[0].clone();
            for (term, op) in terms[1..].iter().zip(&logic) {
                when = format!("{when} {op} {term}");
            }
            if grouped {
                when = format!("({when}) && f.R == null");
            }
            format!("rule \"R\" \"\" salience {salience} when {when} then f.L = f.L + 1; end")
        })
}

#[derive(Debug, Clone)]
enum Event {
    Enter(usize),
    Exit(usize),
}

fn arb_events() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec(
        prop_oneof![(0_usize..4).prop_map(Event::Enter), (0_usize..4).prop_map(Event::Exit)],
        0..24,
    )
}

fn replay(builder: &mut AstBuilder, event: &Event) {
    match event {
        Event::Enter(0) => builder.enter_rule_entry(),
        Event::Enter(1) => builder.enter_expression(),
        Event::Enter(2) => builder.enter_predicate(),
        Event::Enter(_) => builder.enter_expression_atom(),
        Event::Exit(0) => builder.exit_rule_entry(),
        Event::Exit(1) => builder.exit_expression(),
        Event::Exit(2) => builder.exit_predicate(),
        Event::Exit(_) => builder.exit_expression_atom(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn parsed_rules_leave_an_empty_stack(text in arb_rule_text()) {
        let tree = parse(&text).unwrap();
        let mut builder = AstBuilder::new();
        tree.walk(&mut builder);
        prop_assert_eq!(builder.depth(), 0);
        let (rs, errors) = builder.finish();
        prop_assert!(errors.is_empty(), "{:?}", errors);
        prop_assert_eq!(rs.len(), 1);
    }

    #[test]
    fn rebuilding_printed_rules_is_stable(text in arb_rule_text()) {
        let (rs, errors) = build(&text);
        prop_assert!(errors.is_empty());
        let (again, errors) = build(&rs.to_string());
        prop_assert!(errors.is_empty());
        prop_assert_eq!(again, rs);
    }

    #[test]
    fn arbitrary_event_streams_balance_or_report(events in arb_events()) {
        let mut builder = AstBuilder::new();
        for event in &events {
            replay(&mut builder, event);
        }
        let depth = builder.depth();
        let (_, errors) = builder.finish();
        let invariant = errors
            .iter()
            .any(|e| matches!(e, BuildError::BuilderInvariant { .. }));
        prop_assert!(depth == 0 || invariant);
    }
}

// ---------------------------------------------------------------------------
// Printing fluent-built rules
//
// A rule set assembled through the builder API prints as DSL text that
// rebuilds to the same AST.
// ---------------------------------------------------------------------------

fn arb_then() -> impl Strategy<Value = ThenScope> {
    prop::collection::vec(prop_oneof![Just(0_u8), Just(1), Just(2)], 1..4).prop_map(|kinds| {
        kinds.into_iter().fold(ThenScope::default(), |then, kind| match kind {
            0 => then.assign("f.L", var("f.L").plus(lit(1_i64))),
            1 => then.assign("f.R", lit("done")),
            _ => then.call("DEFUNC.Retract", vec![]),
        })
    })
}

fn arb_fluent_ruleset() -> impl Strategy<Value = RuleSet> {
    prop::collection::vec((arb_condition(), arb_then(), -3_i64..3), 1..4).prop_map(|rules| {
        rules
            .into_iter()
            .enumerate()
            .fold(RuleSetBuilder::new(), |builder, (i, (when, then, salience))| {
                builder.rule(
                    RuleEntry::new(format!("R{i}"), when, then)
                        .with_description(format!("rule {i}"))
                        .with_salience(salience),
                )
            })
            .build()
            .unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn fluent_rulesets_print_and_rebuild(rs in arb_fluent_ruleset()) {
        let printed = rs.to_string();
        let (again, errors) = build(&printed);
        prop_assert!(errors.is_empty(), "{:?}\n{}", errors, printed);
        prop_assert_eq!(again, rs, "printed form:\n{}", printed);
    }
}

use chrono::{DateTime, TimeZone, Utc};
use ruleforge::{
    build, host_object, lit, var, BuildError, DataContext, Engine, Expression, HostObject,
    ObjectRef, Record, RuleEntry, RuleSet, RuleSetBuilder, ThenScope, Value,
};

#[derive(Debug, Clone)]
struct User {
    age: i64,
    adult: bool,
}

host_object!(User {
    "Age" => age,
    "Adult" => adult,
});

fn rules(input: &str) -> RuleSet {
    RuleSet::from_dsl(input).unwrap()
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Fact update, single fire
// ---------------------------------------------------------------------------

#[test]
fn condition_false_leaves_facts_untouched() {
    let rs = rules(r#"rule "Adult" "" when user.Age >= 18 then user.Adult = true; end"#);
    let data = DataContext::new().set(
        "user",
        ObjectRef::new(User {
            age: 17,
            adult: false,
        }),
    );

    let mut engine = Engine::new(&rs, data);
    let result = engine.run();
    assert!(result.is_ok());
    assert_eq!(result.cycles_run(), 1);
    assert!(result.fired_rules().is_empty());
    assert_eq!(engine.data().lookup("user.Adult").unwrap(), Value::Bool(false));
}

#[test]
fn typed_host_object_is_updated() {
    let rs = rules(
        r#"rule "Adult" "" when user.Age >= 18 && user.Adult == false then user.Adult = true; end"#,
    );
    let user = ObjectRef::new(User {
        age: 40,
        adult: false,
    });
    let data = DataContext::new().set("user", user.clone());

    let result = Engine::new(&rs, data).run();
    assert_eq!(result.fired_rules(), ["Adult"]);
    assert_eq!(result.cycles_run(), 2);
    assert_eq!(user.read().get_field("Adult"), Some(Value::Bool(true)));
}

// ---------------------------------------------------------------------------
// Increment to fixpoint
// ---------------------------------------------------------------------------

#[test]
fn increments_until_fixpoint() {
    let rs = rules(r#"rule "Inc" "" when ctx.n < 3 then ctx.n = ctx.n + 1; end"#);
    let data = DataContext::new().set("ctx", Record::new("Ctx").with("n", 0_i64).into_ref());

    let mut engine = Engine::new(&rs, data);
    let result = engine.run();
    assert!(result.is_ok());
    assert_eq!(result.cycles_run(), 4);
    assert_eq!(result.fired_rules().len(), 3);
    assert_eq!(engine.data().lookup("ctx.n").unwrap(), Value::Int(3));
}

// ---------------------------------------------------------------------------
// Salience tiebreak
// ---------------------------------------------------------------------------

#[test]
fn higher_salience_fires_first() {
    let rs = rules(
        r#"
        rule "R_lo" "" salience 1 when flag.On == true then flag.Seen = flag.Seen + "lo"; end
        rule "R_hi" "" salience 10 when flag.On == true then flag.On = false; flag.Seen = flag.Seen + "hi"; end
        "#,
    );
    let data = DataContext::new().set(
        "flag",
        Record::new("Flag").with("On", true).with("Seen", "").into_ref(),
    );

    let mut engine = Engine::new(&rs, data);
    let result = engine.run();
    assert_eq!(result.fired_rules(), ["R_hi"]);
    assert_eq!(engine.data().lookup("flag.Seen").unwrap(), Value::from("hi"));
}

// ---------------------------------------------------------------------------
// Duplicate name
// ---------------------------------------------------------------------------

#[test]
fn duplicate_names_keep_the_first_rule() {
    let (rs, errors) = build(
        r#"
        rule "X" "first" when a.B == 1 then a.B = 2; end
        rule "X" "second" when a.B == 2 then a.B = 3; end
        "#,
    );
    assert_eq!(errors, vec![BuildError::DuplicateRule { name: "X".into() }]);
    assert_eq!(rs.len(), 1);
    assert_eq!(rs.get("X").unwrap().description, "first");
}

// ---------------------------------------------------------------------------
// Programmatic rule set
// ---------------------------------------------------------------------------

#[test]
fn fluent_ruleset_runs_and_prints() {
    let rs = RuleSetBuilder::new()
        .rule(
            RuleEntry::new(
                "Minor",
                Expression::from(var("user.Age").lt(lit(18_i64)))
                    .and(var("user.Adult").neq(lit(false))),
                ThenScope::default().assign("user.Adult", lit(false)),
            )
            .with_salience(10),
        )
        .rule(
            RuleEntry::new(
                "Adult",
                Expression::from(var("user.Age").gte(lit(18_i64)))
                    .and(var("user.Adult").eq(lit(false))),
                ThenScope::default().assign("user.Adult", lit(true)),
            )
            .with_description("of age"),
        )
        .build()
        .unwrap();

    let user = ObjectRef::new(User {
        age: 30,
        adult: false,
    });
    let result = Engine::new(&rs, DataContext::new().set("user", user.clone())).run();
    assert!(result.is_ok());
    assert_eq!(result.fired_rules(), ["Adult"]);
    assert_eq!(user.read().get_field("Adult"), Some(Value::Bool(true)));

    let (reparsed, errors) = build(&rs.to_string());
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(reparsed, rs);
}

// ---------------------------------------------------------------------------
// Time comparison
// ---------------------------------------------------------------------------

fn expire(created: DateTime<Utc>, now: DateTime<Utc>) -> Vec<String> {
    let rs = rules(
        r#"rule "Expire" "" when order.CreatedAt < now.Now && order.Expired == false
           then order.Expired = true; end"#,
    );
    let data = DataContext::new()
        .set(
            "order",
            Record::new("Order")
                .with("CreatedAt", created)
                .with("Expired", false)
                .into_ref(),
        )
        .set("now", Record::new("Clock").with("Now", now).into_ref());
    Engine::new(&rs, data).run().fired_rules().to_vec()
}

#[test]
fn earlier_time_fires() {
    assert_eq!(expire(day(1), day(2)), ["Expire"]);
}

#[test]
fn later_time_does_not_fire() {
    assert!(expire(day(2), day(1)).is_empty());
}

// ---------------------------------------------------------------------------
// Short-circuit safety
// ---------------------------------------------------------------------------

#[test]
fn null_guard_short_circuits() {
    let rs = rules(
        r#"rule "Greet" "" when user != null && user.Age > 18 then user.Age = 0; end"#,
    );
    let data = DataContext::new().set("user", Value::Null);

    let result = Engine::new(&rs, data).run();
    assert!(result.is_ok(), "unexpected error: {:?}", result.error());
    assert!(result.fired_rules().is_empty());
    assert_eq!(result.cycles_run(), 1);
}

#[test]
fn missing_guard_demotes_instead_of_failing() {
    let rs = rules(r#"rule "Greet" "" when user.Age > 18 then user.Age = 0; end"#);
    let data = DataContext::new().set("user", Value::Null);

    let result = Engine::new(&rs, data).run();
    assert!(result.is_ok());
    assert!(result.fired_rules().is_empty());
}

use ruleforge::{
    host_object, lit, var, DataContext, Engine, Expression, ObjectRef, RuleEntry, RuleSetBuilder,
    ThenScope,
};

#[derive(Debug, Clone)]
struct Applicant {
    age: i64,
    income: f64,
    status: String,
}

host_object!(Applicant {
    "Age" => age,
    "Income" => income,
    "Status" => status,
});

fn main() {
    // Define rules
    let ruleset = RuleSetBuilder::new()
        .rule(
            RuleEntry::new(
                "Underage",
                Expression::from(var("a.Age").lt(lit(18_i64)))
                    .and(var("a.Status").neq(lit("rejected"))),
                ThenScope::default().assign("a.Status", lit("rejected")),
            )
            .with_salience(10),
        )
        .rule(
            RuleEntry::new(
                "Approve",
                Expression::from(var("a.Status").eq(lit("pending")))
                    .and(var("a.Income").times(lit(0.3)).gte(lit(500_i64))),
                ThenScope::default().assign("a.Status", lit("approved")),
            )
            .with_description("income covers the repayment"),
        )
        .build()
        .expect("failed to build ruleset");

    println!("{ruleset}");

    let applicant = ObjectRef::new(Applicant {
        age: 34,
        income: 2400.0,
        status: "pending".into(),
    });
    let data = DataContext::new().set("a", applicant);

    let mut engine = Engine::new(&ruleset, data);
    let result = engine.run();
    println!("{result}");
    match engine.data().lookup("a.Status") {
        Ok(status) => println!("Status: {status}"),
        Err(e) => println!("No status: {e}"),
    }
}

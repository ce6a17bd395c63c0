use ruleforge::{DataContext, Engine, RuleSet};

fn main() {
    let ruleset =
        RuleSet::from_dsl(include_str!("loyalty.rules")).expect("failed to build rules");

    println!("{ruleset}");

    let data = DataContext::from_json_str(include_str!("facts.json")).expect("failed to load facts");

    let mut engine = Engine::new(&ruleset, data);
    let result = engine.run();
    println!("{result}");
    println!("{:#}", engine.data().to_json());
}

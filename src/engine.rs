use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::evaluate::EvalContext;
use crate::{DataContext, EngineError, RuleEntry, RuleSet, RunResult};

/// Cycle limit used when none is configured.
pub const DEFAULT_MAX_CYCLES: usize = 5000;

/// Run-time limits for an [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    max_cycles: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            cancel: None,
        }
    }
}

impl EngineOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of cycles before the run stops with
    /// [`EngineError::CycleLimit`].
    #[must_use]
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// A flag the host sets to stop the run. It is checked before every
    /// cycle and before every rule condition.
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub fn max_cycles(&self) -> usize {
        self.max_cycles
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Forward-chaining driver: fires one rule per cycle until no condition
/// holds.
///
/// Each cycle evaluates every rule's condition in source order, picks the
/// matching rule with the highest salience (the earliest one on ties) and
/// runs its actions. A rule whose condition fails to evaluate is logged and
/// left out of every later cycle.
///
/// ```
/// use ruleforge::{DataContext, Engine, Record, RuleSet, Value};
///
/// let rules = RuleSet::from_dsl(
///     r#"rule "Count" "count to three" when ctx.N < 3 then ctx.N = ctx.N + 1; end"#,
/// ).unwrap();
/// let data = DataContext::new().set("ctx", Record::new("Counter").with("N", 0_i64).into_ref());
///
/// let mut engine = Engine::new(&rules, data);
/// let result = engine.run();
/// assert!(result.is_ok());
/// assert_eq!(result.cycles_run(), 4);
/// assert_eq!(engine.data().lookup("ctx.N").unwrap(), Value::Int(3));
/// ```
#[derive(Debug)]
pub struct Engine<'r> {
    ruleset: &'r RuleSet,
    data: DataContext,
    options: EngineOptions,
}

impl<'r> Engine<'r> {
    /// An engine with [`EngineOptions::default`].
    #[must_use]
    pub fn new(ruleset: &'r RuleSet, data: DataContext) -> Self {
        Self::with_options(ruleset, data, EngineOptions::default())
    }

    #[must_use]
    pub fn with_options(ruleset: &'r RuleSet, data: DataContext, options: EngineOptions) -> Self {
        Self {
            ruleset,
            data,
            options,
        }
    }

    #[must_use]
    pub fn data(&self) -> &DataContext {
        &self.data
    }

    /// Give the data context back to the caller.
    #[must_use]
    pub fn into_data(self) -> DataContext {
        self.data
    }

    /// Run cycles until a fixpoint, a retract, an action error, the cycle
    /// limit or cancellation.
    pub fn run(&mut self) -> RunResult {
        let started = Instant::now();
        let ctx = EvalContext::new(&self.data);
        let mut demoted: HashSet<&str> = HashSet::new();
        let mut fired = Vec::new();
        let mut cycles = 0;

        self.data.reset_retract();
        let error = 'run: loop {
            if self.options.cancelled() {
                break 'run Some(EngineError::Cancelled { cycles });
            }
            if cycles >= self.options.max_cycles {
                break 'run Some(EngineError::CycleLimit {
                    limit: self.options.max_cycles,
                });
            }
            cycles += 1;

            let mut agenda = 0;
            let mut selected: Option<&RuleEntry> = None;
            for rule in self.ruleset.iter() {
                if self.options.cancelled() {
                    break 'run Some(EngineError::Cancelled { cycles });
                }
                if demoted.contains(rule.name.as_str()) {
                    continue;
                }
                match rule.matches(&ctx) {
                    Ok(true) => {
                        agenda += 1;
                        if selected.map_or(true, |best| rule.salience > best.salience) {
                            selected = Some(rule);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(rule = %rule.name, error = %e, "condition failed, rule demoted");
                        demoted.insert(rule.name.as_str());
                    }
                }
            }
            debug!(cycle = cycles, agenda, "agenda evaluated");

            let Some(rule) = selected else {
                info!(cycles, fired = fired.len(), "fixpoint reached");
                break 'run None;
            };
            info!(cycle = cycles, rule = %rule.name, salience = rule.salience, "firing rule");
            fired.push(rule.name.clone());
            if let Err(source) = rule.fire(&ctx) {
                break 'run Some(EngineError::Action {
                    rule: rule.name.clone(),
                    source,
                });
            }
            if self.data.is_retracted() {
                info!(cycles, rule = %rule.name, "run retracted");
                break 'run None;
            }
        };

        if let Some(e) = &error {
            warn!(cycles, error = %e, "run stopped");
        }
        RunResult::new(cycles, fired, error, started.elapsed())
    }
}

use std::fmt;
use std::time::Duration;

use super::error::EngineError;

/// Process exit code for a run that reached a fixpoint or was retracted.
pub const EXIT_OK: i32 = 0;
/// Process exit code when the rule text failed to build.
pub const EXIT_BUILD_ERROR: i32 = 1;
/// Process exit code when a rule action failed.
pub const EXIT_RUNTIME_ERROR: i32 = 2;
/// Process exit code when the cycle limit was hit.
pub const EXIT_CYCLE_LIMIT: i32 = 3;
/// Process exit code when the run was cancelled.
pub const EXIT_CANCELLED: i32 = 4;

/// Outcome of [`Engine::run()`](crate::Engine::run).
///
/// Contains the number of cycles executed, the rules fired in order, the
/// error that ended the run early (if any) and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct RunResult {
    cycles_run: usize,
    fired_rules: Vec<String>,
    error: Option<EngineError>,
    duration: Duration,
}

impl RunResult {
    pub(crate) fn new(
        cycles_run: usize,
        fired_rules: Vec<String>,
        error: Option<EngineError>,
        duration: Duration,
    ) -> Self {
        Self {
            cycles_run,
            fired_rules,
            error,
            duration,
        }
    }

    /// Cycles started, including the final one whose agenda was empty.
    #[must_use]
    pub fn cycles_run(&self) -> usize {
        self.cycles_run
    }

    /// Names of fired rules, one entry per firing.
    #[must_use]
    pub fn fired_rules(&self) -> &[String] {
        &self.fired_rules
    }

    #[must_use]
    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Map the outcome to a process exit code.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match &self.error {
            None => EXIT_OK,
            Some(EngineError::Action { .. }) => EXIT_RUNTIME_ERROR,
            Some(EngineError::CycleLimit { .. }) => EXIT_CYCLE_LIMIT,
            Some(EngineError::Cancelled { .. }) => EXIT_CANCELLED,
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycles: {}", self.cycles_run)?;
        write!(f, ", fired: [{}]", self.fired_rules.join(", "))?;
        match &self.error {
            Some(e) => write!(f, ", error: {e}")?,
            None => write!(f, ", error: none")?,
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_accessors() {
        let result = RunResult::new(
            3,
            vec!["r1".into(), "r2".into()],
            None,
            Duration::from_nanos(500),
        );
        assert_eq!(result.cycles_run(), 3);
        assert_eq!(result.fired_rules(), &["r1", "r2"]);
        assert!(result.is_ok());
        assert_eq!(result.exit_code(), EXIT_OK);
        assert_eq!(result.duration(), Duration::from_nanos(500));
    }

    #[test]
    fn exit_codes_follow_error() {
        let limit = RunResult::new(
            5,
            vec![],
            Some(EngineError::CycleLimit { limit: 5 }),
            Duration::ZERO,
        );
        assert_eq!(limit.exit_code(), EXIT_CYCLE_LIMIT);
        let cancelled = RunResult::new(
            0,
            vec![],
            Some(EngineError::Cancelled { cycles: 0 }),
            Duration::ZERO,
        );
        assert_eq!(cancelled.exit_code(), EXIT_CANCELLED);
    }

    #[test]
    fn display_lists_fired_rules() {
        let result = RunResult::new(2, vec!["r1".into()], None, Duration::from_nanos(100));
        let s = result.to_string();
        assert!(s.contains("cycles: 2"));
        assert!(s.contains("fired: [r1]"));
        assert!(s.contains("error: none"));
    }
}

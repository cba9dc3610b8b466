use mockseed_config::DEFAULT_UNIQUE_ATTEMPTS;
use mockseed_core::Value;

use crate::errors::PopulateError;

/// Bounded regeneration for values that must not collide with stored ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

/// Value accepted by [`RetryPolicy::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum UniqueOutcome {
    /// No stored record holds the value.
    Unique { value: Value, attempts: u32 },
    /// Every attempt collided; the last candidate is accepted anyway.
    Exhausted { value: Value, attempts: u32 },
}

impl UniqueOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            UniqueOutcome::Unique { attempts, .. } | UniqueOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            UniqueOutcome::Unique { value, .. } | UniqueOutcome::Exhausted { value, .. } => value,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, UniqueOutcome::Exhausted { .. })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_UNIQUE_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Generate candidates until one does not collide or the budget runs out.
    ///
    /// Each attempt is one call to `generate` followed by one call to
    /// `collides`. `Null` candidates never collide.
    pub fn resolve<G, C>(
        &self,
        mut generate: G,
        mut collides: C,
    ) -> Result<UniqueOutcome, PopulateError>
    where
        G: FnMut() -> Result<Value, PopulateError>,
        C: FnMut(&Value) -> Result<bool, PopulateError>,
    {
        let mut attempts = 0;
        loop {
            let value = generate()?;
            attempts += 1;
            if value.is_null() || !collides(&value)? {
                return Ok(UniqueOutcome::Unique { value, attempts });
            }
            if attempts >= self.max_attempts {
                return Ok(UniqueOutcome::Exhausted { value, attempts });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_colliding_generator_runs_exactly_five_times() {
        let policy = RetryPolicy::default();
        let mut generated = 0;
        let mut checked = 0;
        let outcome = policy
            .resolve(
                || {
                    generated += 1;
                    Ok(Value::Int(generated))
                },
                |_| {
                    checked += 1;
                    Ok(true)
                },
            )
            .expect("resolve");

        assert_eq!(generated, 5);
        assert_eq!(checked, 5);
        assert!(outcome.is_exhausted());
        assert_eq!(outcome.attempts(), 5);
        assert_eq!(outcome.into_value(), Value::Int(5));
    }

    #[test]
    fn unique_generator_runs_once() {
        let policy = RetryPolicy::default();
        let mut generated = 0;
        let outcome = policy
            .resolve(
                || {
                    generated += 1;
                    Ok(Value::Int(42))
                },
                |_| Ok(false),
            )
            .expect("resolve");

        assert_eq!(generated, 1);
        assert_eq!(outcome, UniqueOutcome::Unique { value: Value::Int(42), attempts: 1 });
    }

    #[test]
    fn stops_at_first_free_value() {
        let policy = RetryPolicy::new(10);
        let mut next = 0;
        let outcome = policy
            .resolve(
                || {
                    next += 1;
                    Ok(Value::Int(next))
                },
                |value| Ok(value.as_i64().is_some_and(|v| v < 3)),
            )
            .expect("resolve");
        assert_eq!(outcome, UniqueOutcome::Unique { value: Value::Int(3), attempts: 3 });
    }

    #[test]
    fn null_never_collides_and_zero_budget_is_one_attempt() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.max_attempts(), 1);

        let mut lookups = 0;
        let outcome = policy
            .resolve(
                || Ok(Value::Null),
                |_| {
                    lookups += 1;
                    Ok(true)
                },
            )
            .expect("resolve");
        assert_eq!(lookups, 0);
        assert!(!outcome.is_exhausted());
    }

    #[test]
    fn generator_errors_propagate() {
        let policy = RetryPolicy::default();
        let result = policy.resolve(
            || Err(PopulateError::handler("library.Book.isbn", "boom")),
            |_| Ok(false),
        );
        assert!(matches!(result, Err(PopulateError::Handler { .. })));
    }
}

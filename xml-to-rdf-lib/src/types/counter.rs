use std::collections::HashMap;
use std::str::FromStr;

use crate::ProcessorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterIteration {
    #[default]
    Increment,
    Decrement,
}

impl FromStr for CounterIteration {
    type Err = ProcessorError;

    /// Anything other than `decrement` counts up.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("decrement") {
            Ok(CounterIteration::Decrement)
        } else {
            Ok(CounterIteration::Increment)
        }
    }
}

#[derive(Debug, Clone)]
struct Counter {
    value: i64,
    iteration: CounterIteration,
}

impl Counter {
    fn step(&mut self) {
        match self.iteration {
            CounterIteration::Increment => self.value += 1,
            CounterIteration::Decrement => self.value -= 1,
        }
    }
}

/// Named integer counters for one document run.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: HashMap<String, Counter>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the counter, or reset an existing one to `initial_value` with
    /// the given direction.
    pub fn define(&mut self, name: &str, initial_value: i64, iteration: CounterIteration) {
        let counter = self
            .counters
            .entry(name.to_string())
            .or_insert_with(|| Counter {
                value: initial_value,
                iteration,
            });
        counter.value = initial_value;
        counter.iteration = iteration;
    }

    pub fn iterate(&mut self, name: &str) -> Result<i64, ProcessorError> {
        let counter = self
            .counters
            .get_mut(name)
            .ok_or_else(|| ProcessorError::UnknownCounter(name.to_string()))?;
        counter.step();
        Ok(counter.value)
    }

    pub fn value(&self, name: &str) -> Result<i64, ProcessorError> {
        self.counters
            .get(name)
            .map(|counter| counter.value)
            .ok_or_else(|| ProcessorError::UnknownCounter(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_counter_counts_up() {
        let mut counters = CounterRegistry::new();
        counters.define("i", 0, CounterIteration::default());
        assert_eq!(counters.iterate("i").unwrap(), 1);
        assert_eq!(counters.iterate("i").unwrap(), 2);
        assert_eq!(counters.iterate("i").unwrap(), 3);
        assert_eq!(counters.value("i").unwrap(), 3);
    }

    #[test]
    fn test_redefine_resets_value_and_direction() {
        let mut counters = CounterRegistry::new();
        counters.define("i", 5, CounterIteration::Increment);
        counters.iterate("i").unwrap();
        counters.define("i", 10, "decrement".parse().unwrap());
        assert_eq!(counters.value("i").unwrap(), 10);
        assert_eq!(counters.iterate("i").unwrap(), 9);
    }

    #[test]
    fn test_unknown_counter() {
        let mut counters = CounterRegistry::new();
        assert!(matches!(
            counters.iterate("missing"),
            Err(ProcessorError::UnknownCounter(name)) if name == "missing"
        ));
        assert!(counters.value("missing").is_err());
    }

    #[test]
    fn test_iteration_parsing() {
        assert_eq!(
            " Decrement ".parse::<CounterIteration>().unwrap(),
            CounterIteration::Decrement
        );
        assert_eq!(
            "sideways".parse::<CounterIteration>().unwrap(),
            CounterIteration::Increment
        );
    }
}

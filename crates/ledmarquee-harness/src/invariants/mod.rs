//! Invariant checking for port queue testing.
//!
//! Invariants are properties that must always hold while a queue runs.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across every interleaving a property test
//! generates.
//!
//! # Architecture
//!
//! Test operations record what they do into an [`ExecutionTrace`]: when they
//! were submitted, started, and finished. Registered [`Invariant`] checks
//! then run against the recorded events. Violations carry enough context to
//! find the offending operation.
//!
//! # Usage
//!
//! ```ignore
//! let trace = ExecutionTrace::new();
//! // ... submit operations that call trace.started(id) / trace.finished(id)
//! InvariantRegistry::standard().assert_all(&trace, "after random schedule");
//! ```

mod checks;
mod trace;

pub use checks::{KeyedCompletion, KeyedFreshness, PlainFifoOrder, SingleInFlight};
pub use trace::{ExecutionTrace, TraceEvent};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against a recorded trace.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the recorded events.
    fn check(&self, events: &[TraceEvent]) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the queue invariants that hold at any point.
    ///
    /// Includes:
    /// - [`SingleInFlight`]: never two operations at once
    /// - [`PlainFifoOrder`]: plain operations start in submission order
    /// - [`KeyedFreshness`]: a superseded keyed operation never starts
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SingleInFlight);
        registry.add(PlainFifoOrder);
        registry.add(KeyedFreshness);
        registry
    }

    /// [`standard`](Self::standard) plus the checks that only hold once the
    /// queue has drained.
    pub fn drained() -> Self {
        let mut registry = Self::standard();
        registry.add(KeyedCompletion);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the trace.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, trace: &ExecutionTrace) -> Result<(), Vec<Violation>> {
        let events = trace.events();
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(&events).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, trace: &ExecutionTrace, context: &str) {
        if let Err(violations) = self.check_all(trace) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 3);
        assert_eq!(InvariantRegistry::drained().len(), 4);
    }

    #[test]
    fn empty_trace_passes_invariants() {
        let registry = InvariantRegistry::drained();
        assert!(registry.check_all(&ExecutionTrace::new()).is_ok());
    }

    #[test]
    fn violation_display_names_invariant() {
        let violation = Violation { invariant: "SingleInFlight", message: "overlap".into() };
        assert_eq!(violation.to_string(), "SingleInFlight: overlap");
    }
}

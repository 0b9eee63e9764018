//! Scripted port selection.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use ledmarquee_core::{PickError, PickedPort, PortInfo, PortPicker, Transport};

/// Picker that replays a fixed sequence of outcomes.
///
/// Once the script runs out every pick is cancelled, like a user closing
/// the chooser.
#[derive(Default)]
pub struct ScriptedPicker {
    script: Mutex<VecDeque<Result<PickedPort, PickError>>>,
}

impl ScriptedPicker {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picker whose first pick returns `transport`.
    pub fn with_port(transport: impl Transport, label: &str) -> Self {
        Self::new().then_port(transport, label)
    }

    /// Picker whose first pick fails with `err`.
    pub fn failing(err: PickError) -> Self {
        Self::new().then_error(err)
    }

    /// Append a successful pick.
    #[must_use]
    pub fn then_port(self, transport: impl Transport, label: &str) -> Self {
        self.push(Ok(PickedPort::new(transport, PortInfo::labelled(label))));
        self
    }

    /// Append a failed pick.
    #[must_use]
    pub fn then_error(self, err: PickError) -> Self {
        self.push(Err(err));
        self
    }

    /// Outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn push(&self, outcome: Result<PickedPort, PickError>) {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(outcome);
    }
}

impl PortPicker for ScriptedPicker {
    async fn pick(&self) -> Result<PickedPort, PickError> {
        let next = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        next.unwrap_or(Err(PickError::Cancelled))
    }
}

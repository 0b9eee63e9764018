//! Standard queue invariants.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashMap;

use super::{Invariant, InvariantResult, TraceEvent, Violation};

fn keys(events: &[TraceEvent]) -> HashMap<u64, Option<&str>> {
    events
        .iter()
        .filter_map(|event| match event {
            TraceEvent::Submitted { id, key } => Some((*id, key.as_deref())),
            _ => None,
        })
        .collect()
}

/// At most one operation executes at any instant.
///
/// Every `Started` must be followed by the matching `Finished` before the
/// next `Started`. Overlap means two transactions could interleave bytes on
/// the wire.
pub struct SingleInFlight;

impl Invariant for SingleInFlight {
    fn name(&self) -> &'static str {
        "SingleInFlight"
    }

    fn check(&self, events: &[TraceEvent]) -> InvariantResult {
        let mut running: Option<u64> = None;
        for event in events {
            match (event, running) {
                (TraceEvent::Started { id }, Some(current)) => {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("op {id} started while op {current} still running"),
                    });
                },
                (TraceEvent::Started { id }, None) => running = Some(*id),
                (TraceEvent::Finished { id }, Some(current)) if *id == current => running = None,
                (TraceEvent::Finished { id }, _) => {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("op {id} finished without running"),
                    });
                },
                (TraceEvent::Submitted { .. }, _) => {},
            }
        }
        Ok(())
    }
}

/// Plain operations start in the order they were submitted.
///
/// The started plain operations must be a prefix of the submitted plain
/// operations: none skipped, none reordered.
pub struct PlainFifoOrder;

impl Invariant for PlainFifoOrder {
    fn name(&self) -> &'static str {
        "PlainFifoOrder"
    }

    fn check(&self, events: &[TraceEvent]) -> InvariantResult {
        let keys = keys(events);
        let is_plain = |id: &u64| keys.get(id).is_some_and(Option::is_none);

        let submitted: Vec<u64> = events
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Submitted { id, key: None } => Some(*id),
                _ => None,
            })
            .collect();
        let started: Vec<u64> = events
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Started { id } if is_plain(id) => Some(*id),
                _ => None,
            })
            .collect();

        if submitted.starts_with(&started) {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!("start order {started:?} is not a prefix of {submitted:?}"),
            })
        }
    }
}

/// A keyed operation never starts after a newer submission under its key.
///
/// Once a newer operation under the same key has been submitted, the older
/// one is stale and must not reach the wire.
pub struct KeyedFreshness;

impl Invariant for KeyedFreshness {
    fn name(&self) -> &'static str {
        "KeyedFreshness"
    }

    fn check(&self, events: &[TraceEvent]) -> InvariantResult {
        let keys = keys(events);
        let mut latest: HashMap<&str, u64> = HashMap::new();

        for event in events {
            match event {
                TraceEvent::Submitted { id, key: Some(key) } => {
                    latest.insert(key.as_str(), *id);
                },
                TraceEvent::Started { id } => {
                    let Some(Some(key)) = keys.get(id) else { continue };
                    if let Some(newest) = latest.get(key).filter(|&&newest| newest != *id) {
                        return Err(Violation {
                            invariant: self.name(),
                            message: format!(
                                "op {id} under key {key:?} started after newer op {newest}"
                            ),
                        });
                    }
                },
                _ => {},
            }
        }
        Ok(())
    }
}

/// After draining, the last submission under every key has run.
///
/// Coalescing may drop intermediate frames but never the final one.
pub struct KeyedCompletion;

impl Invariant for KeyedCompletion {
    fn name(&self) -> &'static str {
        "KeyedCompletion"
    }

    fn check(&self, events: &[TraceEvent]) -> InvariantResult {
        let mut latest: HashMap<&str, u64> = HashMap::new();
        for event in events {
            if let TraceEvent::Submitted { id, key: Some(key) } = event {
                latest.insert(key.as_str(), *id);
            }
        }

        for (key, id) in latest {
            let ran = events.iter().any(|e| matches!(e, TraceEvent::Finished { id: done } if *done == id));
            if !ran {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("latest op {id} under key {key:?} never ran"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(id: u64) -> TraceEvent {
        TraceEvent::Submitted { id, key: None }
    }

    fn keyed(id: u64) -> TraceEvent {
        TraceEvent::Submitted { id, key: Some("draw".into()) }
    }

    fn run(id: u64) -> [TraceEvent; 2] {
        [TraceEvent::Started { id }, TraceEvent::Finished { id }]
    }

    #[test]
    fn overlap_detected() {
        let events = vec![
            submitted(1),
            submitted(2),
            TraceEvent::Started { id: 1 },
            TraceEvent::Started { id: 2 },
        ];
        assert!(SingleInFlight.check(&events).is_err());
    }

    #[test]
    fn reorder_detected() {
        let mut events = vec![submitted(1), submitted(2)];
        events.extend(run(2));
        events.extend(run(1));
        assert!(PlainFifoOrder.check(&events).is_err());
    }

    #[test]
    fn stale_keyed_start_detected() {
        let mut events = vec![keyed(1), keyed(2)];
        events.extend(run(1));
        assert!(KeyedFreshness.check(&events).is_err());
    }

    #[test]
    fn latest_keyed_must_run() {
        let mut events = vec![keyed(1)];
        events.extend(run(1));
        events.push(keyed(2));
        assert!(KeyedFreshness.check(&events).is_ok());
        assert!(KeyedCompletion.check(&events).is_err());

        events.extend(run(2));
        assert!(KeyedCompletion.check(&events).is_ok());
    }
}

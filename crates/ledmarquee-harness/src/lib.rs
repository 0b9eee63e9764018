//! Test harness for LED matrix device code.
//!
//! Deterministic stand-ins for everything outside the process: a virtual
//! clock, emulated modules on in-memory pipes, a fault-injecting transport,
//! scripted port pickers, and recording frame sinks.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties of a port queue
//! against an [`ExecutionTrace`] recorded while operations run. Use
//! [`InvariantRegistry::standard()`] for the queue's ordering and coalescing
//! guarantees.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chaotic;
pub mod device;
pub mod invariants;
pub mod picker;
pub mod sim_env;
pub mod sink;

pub use chaotic::ChaoticTransport;
pub use device::{DeviceCommand, DeviceHandle, FakeDevice, FakeFirmware};
pub use invariants::{
    ExecutionTrace, Invariant, InvariantRegistry, InvariantResult, KeyedCompletion,
    KeyedFreshness, PlainFifoOrder, SingleInFlight, TraceEvent, Violation,
};
pub use picker::ScriptedPicker;
pub use sim_env::SimEnv;
pub use sink::{FailingSink, RecordingSink};

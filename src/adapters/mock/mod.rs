//! Test doubles for the trait abstractions.
//!
//! - [`ScriptedProbe`] - Replays a scripted sequence of probe outcomes
//! - [`ManualClock`] - Instant sleeps that advance a virtual clock

pub mod clock;
pub mod probe;

pub use clock::ManualClock;
pub use probe::{MockResponse, ScriptedProbe};

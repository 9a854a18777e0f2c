//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`TriggerProbe`] - One existence/mtime check against a backend
//! - [`Clock`] - Current time and sleeping between attempts

pub mod clock;
pub mod probe;

pub use clock::Clock;
pub use probe::{ProbeResult, TriggerProbe};

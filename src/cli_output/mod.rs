//! Line-based progress output for the watch.

mod lines;

pub use lines::*;

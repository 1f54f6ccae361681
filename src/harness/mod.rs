// src/harness/mod.rs

// The harness drives a link from the outside: it never touches framer or
// deframer state directly, only the signals a test bench would see.
pub mod io_helpers;
pub mod sequence;

pub use io_helpers::{drive_frame, drive_line_for, execute_blocking_with_budget, step_n};
pub use sequence::{ByteOutcome, LoopbackHarness, SequenceReport};

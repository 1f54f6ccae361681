// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod config;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod timing;

// --- Re-export key types/traits/functions for easier access ---

// From config.rs
pub use config::{Divisor, LinkConfig};

// From error.rs
pub use error::UartError;

// From frame.rs
pub use frame::{FrameFormat, LineLevel};

// From hal_traits.rs
pub use hal_traits::{ByteSerial, Steppable};

// From timing.rs (constants - users can access via common::timing::*)
// Only the step helpers are re-exported:
pub use timing::{bit_period_steps, frame_steps, send_to_done_steps};

// src/lib.rs

#![no_std] // Specify no_std at the crate root

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod common;
pub mod harness;
pub mod link;

#[cfg(feature = "impl-bitbang")]
pub mod bitbang;

// Re-export key types for convenience
pub use common::{Divisor, LineLevel, LinkConfig, UartError};
pub use link::{UartLink, Wiring};

// src/common/error.rs

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UartError<E = ()>
where
    E: core::fmt::Debug, // Still need Debug for the generic Io error
{
    /// Underlying pin error from the bit-bang adapter.
    #[error("I/O error: {0:?}")] // Format string requires Debug on E
    Io(E),

    /// The reference clock is too slow for the requested 16x oversampled rate,
    /// or one of the two frequencies is zero.
    #[error("Invalid configuration: {reference_frequency} Hz cannot oversample {symbol_rate} baud by 16")]
    InvalidConfig {
        reference_frequency: u32,
        symbol_rate: u32,
    },

    /// A send was requested while the framer still had a frame in flight.
    #[error("Transmitter busy")]
    Busy,

    /// A blocking harness helper gave up after stepping the link this many times.
    #[error("Operation timed out after {steps} reference steps")]
    Timeout { steps: u32 },

    /// A fixed-capacity report was too small for the requested sequence.
    #[error("Buffer overflow: needed {needed}, got {got}")]
    BufferOverflow { needed: usize, got: usize },
}

// Pin-free operations return `UartError<()>`; the bit-bang adapter builds its own
// `UartError<E>` values directly instead of converting.

// src/common/hal_traits.rs

use core::fmt::Debug;

/// Non-blocking byte interface over a UART link.
///
/// Nothing here advances time. `WouldBlock` means the caller has to step the link
/// (or wait for the hardware) and poll again.
pub trait ByteSerial {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Attempts to take the most recently received byte.
    ///
    /// Returns `Ok(byte)` once per successfully received frame, or
    /// `Err(nb::Error::WouldBlock)` if no new byte has arrived since the last read.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Attempts to hand a byte to the transmitter.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` while a previous frame is still in flight.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Returns `Ok(())` once the transmitter is idle again, `WouldBlock` before that.
    fn flush(&mut self) -> nb::Result<(), Self::Error>;
}

/// Anything that advances by one reference-clock step at a time.
pub trait Steppable {
    /// Associated error type for a failed step (pin I/O, for instance).
    type Error: Debug;

    fn step(&mut self) -> Result<(), Self::Error>;
}

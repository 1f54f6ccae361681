// src/common/timing.rs

use super::config::Divisor;

// All durations here are counted in oversampling ticks unless the name says
// otherwise. One bit period is 16 ticks; one tick is `Divisor` reference steps.

// === Frame Shape (8N1) ===

/// Oversampling ticks per bit period.
pub const TICKS_PER_BIT: u32 = 16;
/// Data bits per frame, sent LSB first.
pub const DATA_BITS: u8 = 8;
/// 1 start bit + 8 data bits + 1 stop bit.
pub const BITS_PER_FRAME: u32 = 1 + DATA_BITS as u32 + 1;
/// Ticks the framer needs from the first start-bit tick until it is idle again.
pub const TICKS_PER_FRAME: u32 = BITS_PER_FRAME * TICKS_PER_BIT;

// === Receiver Alignment ===

/// Tick (counted from the one after the falling edge) on which the start bit is
/// re-sampled. Every later sample lands a whole bit period after the previous one,
/// so all samples sit 7/16 of the way into their bit.
pub const START_CONFIRM_TICKS: u32 = 7;

/// Ticks from the edge until the stop bit is sampled and `rx_done` can fire:
/// the confirmation offset plus 8 data bits and the stop bit, 16 ticks each.
pub const TICKS_EDGE_TO_DONE: u32 = START_CONFIRM_TICKS + (DATA_BITS as u32 + 1) * TICKS_PER_BIT;

// === Reference-Step Conversions ===

/// Reference steps spanned by `ticks` oversampling ticks.
#[inline]
pub const fn ticks_to_steps(divisor: Divisor, ticks: u32) -> u64 {
    divisor.get() as u64 * ticks as u64
}

/// Reference steps in one bit period.
#[inline]
pub const fn bit_period_steps(divisor: Divisor) -> u64 {
    ticks_to_steps(divisor, TICKS_PER_BIT)
}

/// Reference steps in one full frame on the wire.
#[inline]
pub const fn frame_steps(divisor: Divisor) -> u64 {
    ticks_to_steps(divisor, TICKS_PER_FRAME)
}

/// Reference steps from a `start_send` on a link whose tick counter is at phase 0
/// until the `rx_done` pulse on the loopback receiver.
///
/// The first tick arrives `Divisor` steps after the request and drives the start
/// bit; the receiver sees the edge on that same step.
#[inline]
pub const fn send_to_done_steps(divisor: Divisor) -> u64 {
    ticks_to_steps(divisor, 1 + TICKS_EDGE_TO_DONE)
}

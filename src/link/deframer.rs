// src/link/deframer.rs

use crate::common::{
    timing::{DATA_BITS, START_CONFIRM_TICKS, TICKS_PER_BIT},
    LineLevel,
};

/// Externally visible phase of the receiver.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeframerState {
    Idle,
    ConfirmStart,
    Receiving,
    ConfirmStop,
}

/// The byte currently being reassembled.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct RxFrame {
    /// Sampled bits; each new one enters at bit 7 and the rest shift down, so
    /// after 8 samples the first one is bit 0.
    shift: u8,
    /// Data bits sampled so far.
    cursor: u8,
    /// Ticks since the edge (while confirming the start bit) or since the last sample.
    ticks: u32,
}

impl RxFrame {
    const fn new() -> Self {
        RxFrame { shift: 0, cursor: 0, ticks: 0 }
    }

    /// Counts one tick. Returns `true` when a full bit period has passed since the
    /// previous sample, i.e. the line is due to be sampled again.
    fn sample_due(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks == TICKS_PER_BIT {
            self.ticks = 0;
            true
        } else {
            false
        }
    }

    fn shift_in(&mut self, line: LineLevel) {
        self.shift >>= 1;
        if line.is_high() {
            self.shift |= 0x80;
        }
        self.cursor += 1;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum RxState {
    Idle,
    ConfirmStart(RxFrame),
    Receiving(RxFrame),
    ConfirmStop(RxFrame),
}

/// Receive state machine: recovers bytes from the wire using nothing but the
/// shared oversampling tick.
///
/// While idle the wire is watched on every reference step so that a falling edge
/// between ticks is not missed. From the edge on, everything is counted in ticks:
/// the start bit is re-checked on the 7th tick and each later sample is 16 ticks
/// after the one before it.
///
/// A start bit that is high again at the confirmation sample is treated as a
/// glitch, and a stop bit sampled low is a framing error. Both just return to
/// `Idle` without publishing anything.
#[derive(Debug, Clone)]
pub struct Deframer {
    state: RxState,
    last_line: LineLevel,
    data: u8,
    done: bool,
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deframer {
    pub const fn new() -> Self {
        Deframer {
            state: RxState::Idle,
            last_line: LineLevel::High,
            data: 0,
            done: false,
        }
    }

    /// Advances by one reference step. `line` is the wire level for this step and
    /// `tick` whether the shared generator ticked on it.
    pub fn on_step(&mut self, line: LineLevel, tick: bool) {
        self.done = false;
        let previous = core::mem::replace(&mut self.last_line, line);

        self.state = match self.state {
            RxState::Idle => {
                if previous.is_high() && line.is_low() {
                    log::trace!("deframer: Idle -> ConfirmStart");
                    RxState::ConfirmStart(RxFrame::new())
                } else {
                    RxState::Idle
                }
            }
            state if !tick => state,
            RxState::ConfirmStart(mut frame) => {
                frame.ticks += 1;
                if frame.ticks < START_CONFIRM_TICKS {
                    RxState::ConfirmStart(frame)
                } else if line.is_low() {
                    log::trace!("deframer: ConfirmStart -> Receiving");
                    frame.ticks = 0;
                    RxState::Receiving(frame)
                } else {
                    log::debug!("deframer: false start, line high at tick {}", START_CONFIRM_TICKS);
                    RxState::Idle
                }
            }
            RxState::Receiving(mut frame) => {
                if frame.sample_due() {
                    frame.shift_in(line);
                    if frame.cursor == DATA_BITS {
                        log::trace!("deframer: Receiving -> ConfirmStop");
                        RxState::ConfirmStop(frame)
                    } else {
                        RxState::Receiving(frame)
                    }
                } else {
                    RxState::Receiving(frame)
                }
            }
            RxState::ConfirmStop(mut frame) => {
                if frame.sample_due() {
                    if line.is_high() {
                        log::debug!("deframer: received {:#04x}", frame.shift);
                        self.data = frame.shift;
                        self.done = true;
                    } else {
                        log::debug!("deframer: framing error, discarding {:#04x}", frame.shift);
                    }
                    RxState::Idle
                } else {
                    RxState::ConfirmStop(frame)
                }
            }
        };
    }

    /// Returns to `Idle`, dropping any frame in flight and clearing `data`.
    ///
    /// `line` is the wire level at the moment of reset; it becomes the reference for
    /// edge detection so a wire that is already low does not count as a new edge.
    pub fn reset(&mut self, line: LineLevel) {
        self.state = RxState::Idle;
        self.last_line = line;
        self.data = 0;
        self.done = false;
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.state != RxState::Idle
    }

    /// High for exactly the step on which a byte was accepted.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The last accepted byte; held until the next successful frame.
    #[inline]
    pub fn data(&self) -> u8 {
        self.data
    }

    pub fn state(&self) -> DeframerState {
        match self.state {
            RxState::Idle => DeframerState::Idle,
            RxState::ConfirmStart(_) => DeframerState::ConfirmStart,
            RxState::Receiving(_) => DeframerState::Receiving,
            RxState::ConfirmStop(_) => DeframerState::ConfirmStop,
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::timing::TICKS_EDGE_TO_DONE;

    // Divisor 1: every step is a tick, which keeps the arithmetic readable.
    fn hold(deframer: &mut Deframer, line: LineLevel, ticks: u32) -> u32 {
        let mut done_count = 0;
        for _ in 0..ticks {
            deframer.on_step(line, true);
            if deframer.is_done() {
                done_count += 1;
            }
        }
        done_count
    }

    /// Drives one 8N1 frame onto the deframer, each bit 16 ticks long.
    fn drive_frame(deframer: &mut Deframer, byte: u8, stop: LineLevel) -> u32 {
        let mut done = hold(deframer, LineLevel::Low, TICKS_PER_BIT);
        for bit in 0..8 {
            done += hold(deframer, LineLevel::from_lsb(byte >> bit), TICKS_PER_BIT);
        }
        done + hold(deframer, stop, TICKS_PER_BIT)
    }

    #[test]
    fn test_receives_a5() {
        let mut deframer = Deframer::new();
        hold(&mut deframer, LineLevel::High, 5);
        assert_eq!(drive_frame(&mut deframer, 0xA5, LineLevel::High), 1);
        assert_eq!(deframer.data(), 0xA5);
        assert!(!deframer.is_busy());
    }

    #[test]
    fn test_done_fires_on_expected_tick() {
        let mut deframer = Deframer::new();
        deframer.on_step(LineLevel::Low, true); // edge step
        assert_eq!(deframer.state(), DeframerState::ConfirmStart);
        // 0x00: line low through all data bits, then high for stop
        let mut ticks_after_edge = 0;
        loop {
            ticks_after_edge += 1;
            let line = if ticks_after_edge < 16 * 9 { LineLevel::Low } else { LineLevel::High };
            deframer.on_step(line, true);
            if deframer.is_done() {
                break;
            }
            assert!(ticks_after_edge < 200, "no rx_done");
        }
        assert_eq!(ticks_after_edge, TICKS_EDGE_TO_DONE);
        assert_eq!(deframer.data(), 0x00);
    }

    #[test]
    fn test_done_is_a_single_step_pulse() {
        let mut deframer = Deframer::new();
        assert_eq!(drive_frame(&mut deframer, 0x3C, LineLevel::High), 1);
        assert!(!deframer.is_done());
        deframer.on_step(LineLevel::High, false);
        assert!(!deframer.is_done());
        assert_eq!(deframer.data(), 0x3C);
    }

    #[test]
    fn test_edge_seen_between_ticks() {
        let mut deframer = Deframer::new();
        deframer.on_step(LineLevel::High, false);
        deframer.on_step(LineLevel::Low, false);
        assert!(deframer.is_busy());
        assert_eq!(deframer.state(), DeframerState::ConfirmStart);
        // non-tick steps do not advance the confirmation count
        for _ in 0..100 {
            deframer.on_step(LineLevel::High, false);
        }
        assert_eq!(deframer.state(), DeframerState::ConfirmStart);
    }

    #[test]
    fn test_glitch_costs_seven_ticks() {
        let mut deframer = Deframer::new();
        hold(&mut deframer, LineLevel::Low, 3);
        assert!(deframer.is_busy());
        // ticks 1..=6 after the edge only count; tick 7 samples high and gives up
        hold(&mut deframer, LineLevel::High, 4);
        assert!(deframer.is_busy());
        assert_eq!(hold(&mut deframer, LineLevel::High, 1), 0);
        assert!(!deframer.is_busy());
        assert_eq!(deframer.state(), DeframerState::Idle);
    }

    #[test]
    fn test_low_stop_bit_discards_frame() {
        let mut deframer = Deframer::new();
        drive_frame(&mut deframer, 0x42, LineLevel::High);
        assert_eq!(deframer.data(), 0x42);

        hold(&mut deframer, LineLevel::High, 4);
        assert_eq!(drive_frame(&mut deframer, 0x99, LineLevel::Low), 0);
        assert_eq!(deframer.data(), 0x42);
        assert!(!deframer.is_busy());
    }

    #[test]
    fn test_held_low_line_does_not_retrigger() {
        let mut deframer = Deframer::new();
        // break condition: a frame of zeros with a low stop bit, then stays low
        drive_frame(&mut deframer, 0x00, LineLevel::Low);
        hold(&mut deframer, LineLevel::Low, 200);
        assert!(!deframer.is_busy());
        // line recovers, next real frame is received
        hold(&mut deframer, LineLevel::High, 16);
        assert_eq!(drive_frame(&mut deframer, 0x81, LineLevel::High), 1);
        assert_eq!(deframer.data(), 0x81);
    }

    #[test]
    fn test_reset_with_low_line() {
        let mut deframer = Deframer::new();
        drive_frame(&mut deframer, 0x55, LineLevel::High);
        hold(&mut deframer, LineLevel::Low, 20);
        deframer.reset(LineLevel::Low);
        assert!(!deframer.is_busy());
        assert!(!deframer.is_done());
        assert_eq!(deframer.data(), 0);
        deframer.on_step(LineLevel::Low, true);
        assert!(!deframer.is_busy());
    }
}

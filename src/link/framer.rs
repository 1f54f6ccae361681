// src/link/framer.rs

use crate::common::{
    timing::{DATA_BITS, TICKS_PER_BIT},
    LineLevel, UartError,
};

/// Externally visible phase of the transmitter.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramerState {
    Idle,
    SendingStart,
    SendingData,
    SendingStop,
}

/// The byte currently being serialized.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct TxFrame {
    /// Byte as requested, kept for logging.
    byte: u8,
    /// Remaining data bits; bit 0 is the one on the wire.
    shift: u8,
    /// Data bits already sent.
    cursor: u8,
    /// Ticks spent in the current bit period, 0..16.
    ticks: u32,
}

impl TxFrame {
    fn new(byte: u8) -> Self {
        TxFrame { byte, shift: byte, cursor: 0, ticks: 0 }
    }

    /// Counts one tick of the current bit. Returns `true` when its 16th tick has elapsed.
    fn hold(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks == TICKS_PER_BIT {
            self.ticks = 0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum TxState {
    Idle,
    SendingStart(TxFrame),
    SendingData(TxFrame),
    SendingStop(TxFrame),
}

/// Transmit state machine: puts one start bit, 8 data bits (LSB first) and one
/// stop bit on the wire, each held for 16 ticks.
///
/// The wire level only changes inside [`Framer::on_tick`].
#[derive(Debug, Clone)]
pub struct Framer {
    state: TxState,
    line: LineLevel,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    pub const fn new() -> Self {
        Framer { state: TxState::Idle, line: LineLevel::High }
    }

    /// Latches `byte` for transmission. The start bit goes out on the next tick.
    ///
    /// Rejected with [`UartError::Busy`] unless the framer is idle; the frame in
    /// flight is left untouched.
    pub fn start_send(&mut self, byte: u8) -> Result<(), UartError> {
        if self.state != TxState::Idle {
            log::debug!("framer busy, rejecting {:#04x}", byte);
            return Err(UartError::Busy);
        }
        log::trace!("framer: Idle -> SendingStart ({:#04x})", byte);
        self.state = TxState::SendingStart(TxFrame::new(byte));
        Ok(())
    }

    /// Advances the machine by one oversampling tick and updates the wire level.
    pub fn on_tick(&mut self) {
        self.state = match self.state {
            TxState::Idle => {
                self.line = LineLevel::High;
                TxState::Idle
            }
            TxState::SendingStart(mut frame) => {
                self.line = LineLevel::Low;
                if frame.hold() {
                    log::trace!("framer: SendingStart -> SendingData");
                    TxState::SendingData(frame)
                } else {
                    TxState::SendingStart(frame)
                }
            }
            TxState::SendingData(mut frame) => {
                self.line = LineLevel::from_lsb(frame.shift);
                if frame.hold() {
                    frame.shift >>= 1;
                    frame.cursor += 1;
                    if frame.cursor == DATA_BITS {
                        log::trace!("framer: SendingData -> SendingStop");
                        TxState::SendingStop(frame)
                    } else {
                        TxState::SendingData(frame)
                    }
                } else {
                    TxState::SendingData(frame)
                }
            }
            TxState::SendingStop(mut frame) => {
                self.line = LineLevel::High;
                if frame.hold() {
                    log::trace!("framer: SendingStop -> Idle ({:#04x} sent)", frame.byte);
                    TxState::Idle
                } else {
                    TxState::SendingStop(frame)
                }
            }
        };
    }

    /// Drops any frame in flight and releases the wire to idle-high.
    pub fn reset(&mut self) {
        self.state = TxState::Idle;
        self.line = LineLevel::High;
    }

    #[inline]
    pub fn line(&self) -> LineLevel {
        self.line
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.state != TxState::Idle
    }

    pub fn state(&self) -> FramerState {
        match self.state {
            TxState::Idle => FramerState::Idle,
            TxState::SendingStart(_) => FramerState::SendingStart,
            TxState::SendingData(_) => FramerState::SendingData,
            TxState::SendingStop(_) => FramerState::SendingStop,
        }
    }

    /// Index of the data bit on the wire while in `SendingData`.
    pub fn bit_cursor(&self) -> Option<u8> {
        match self.state {
            TxState::SendingData(frame) => Some(frame.cursor),
            _ => None,
        }
    }
}

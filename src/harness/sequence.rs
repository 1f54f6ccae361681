// src/harness/sequence.rs

use super::io_helpers::execute_blocking_with_budget;
use crate::common::{
    hal_traits::ByteSerial,
    timing::{frame_steps, send_to_done_steps},
    LinkConfig, UartError,
};
use crate::link::UartLink;
use arrayvec::ArrayVec;
use core::convert::Infallible;

/// What happened to one byte pushed through the loopback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ByteOutcome {
    pub sent: u8,
    /// `None` if no `rx_done` arrived within the step budget.
    pub received: Option<u8>,
    /// Reference steps from the accepted send to the `rx_done` step (or to giving up).
    pub steps: u64,
}

impl ByteOutcome {
    pub fn passed(&self) -> bool {
        self.received == Some(self.sent)
    }
}

/// Per-byte results of a [`LoopbackHarness::run_sequence`] call, in send order.
#[derive(Debug, Clone, Default)]
pub struct SequenceReport<const N: usize> {
    outcomes: ArrayVec<ByteOutcome, N>,
}

impl<const N: usize> SequenceReport<N> {
    pub fn outcomes(&self) -> &[ByteOutcome] {
        &self.outcomes
    }

    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(ByteOutcome::passed)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Feeds bytes through a loopback link one at a time and records what came back.
///
/// Each byte is only sent after the previous one has been received (or given up
/// on) and the framer is idle again.
#[derive(Debug, Clone)]
pub struct LoopbackHarness {
    link: UartLink,
}

impl LoopbackHarness {
    pub fn new(config: LinkConfig) -> Result<Self, UartError> {
        Ok(LoopbackHarness { link: UartLink::loopback(config)? })
    }

    pub fn link(&self) -> &UartLink {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut UartLink {
        &mut self.link
    }

    pub fn reset(&mut self) {
        self.link.reset();
    }

    /// Steps allowed for each wait before giving up: one full send-to-done time
    /// plus another frame of slack.
    fn step_budget(&self) -> u32 {
        let divisor = self.link.divisor();
        let budget = send_to_done_steps(divisor) + frame_steps(divisor);
        u32::try_from(budget).unwrap_or(u32::MAX)
    }

    /// Sends `bytes` in order and collects one [`ByteOutcome`] per byte.
    ///
    /// A byte that never arrives is recorded with `received: None`; only a report
    /// too small for `bytes` or a transmitter that never frees up is an error.
    pub fn run_sequence<const N: usize>(
        &mut self,
        bytes: &[u8],
    ) -> Result<SequenceReport<N>, UartError> {
        if bytes.len() > N {
            return Err(UartError::BufferOverflow { needed: bytes.len(), got: N });
        }
        let budget = self.step_budget();
        let mut report = SequenceReport { outcomes: ArrayVec::new() };

        for &byte in bytes {
            self.send_one(byte, budget)?;
            let sent_at = self.link.steps();

            let received = match execute_blocking_with_budget(&mut self.link, budget, |l| l.read_byte()) {
                Ok(value) => Some(value),
                Err(UartError::Timeout { steps }) => {
                    log::debug!("harness: {:#04x} not received after {} steps", byte, steps);
                    None
                }
                Err(e) => return Err(narrow(e)),
            };
            let steps = self.link.steps() - sent_at;
            log::debug!("harness: sent {:#04x}, received {:?} after {} steps", byte, received, steps);

            // Let the stop bit finish so the next send starts from an idle line
            execute_blocking_with_budget(&mut self.link, budget, |l| l.flush()).map_err(narrow)?;

            report.outcomes.push(ByteOutcome { sent: byte, received, steps });
        }
        Ok(report)
    }

    fn send_one(&mut self, byte: u8, budget: u32) -> Result<(), UartError> {
        execute_blocking_with_budget(&mut self.link, budget, |l| l.write_byte(byte)).map_err(narrow)
    }
}

/// The loopback link has no I/O, so its errors never carry `Io`.
fn narrow(err: UartError<Infallible>) -> UartError {
    match err {
        UartError::Io(never) => match never {},
        UartError::InvalidConfig { reference_frequency, symbol_rate } => {
            UartError::InvalidConfig { reference_frequency, symbol_rate }
        }
        UartError::Busy => UartError::Busy,
        UartError::Timeout { steps } => UartError::Timeout { steps },
        UartError::BufferOverflow { needed, got } => UartError::BufferOverflow { needed, got },
    }
}

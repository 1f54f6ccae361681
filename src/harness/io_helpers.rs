// src/harness/io_helpers.rs

use crate::common::{hal_traits::Steppable, LineLevel, UartError};
use crate::link::UartLink;
use core::fmt::Debug;
use nb::Result as NbResult;

/// Executes a non-blocking operation (`f`) repeatedly, stepping the link once after
/// every `WouldBlock`, until it completes or `budget` steps have been spent.
pub fn execute_blocking_with_budget<L, FN, T, E>(
    link: &mut L,
    budget: u32,
    mut f: FN,
) -> Result<T, UartError<E>>
where
    L: Steppable<Error = E>,
    E: Debug,
    FN: FnMut(&mut L) -> NbResult<T, E>,
{
    let mut steps = 0;
    loop {
        match f(link) {
            Ok(result) => return Ok(result),
            Err(nb::Error::WouldBlock) => {
                if steps >= budget {
                    return Err(UartError::Timeout { steps });
                }
                link.step().map_err(UartError::Io)?;
                steps += 1;
            }
            Err(nb::Error::Other(e)) => return Err(UartError::Io(e)),
        }
    }
}

/// Steps the link `count` times.
pub fn step_n<L: Steppable>(link: &mut L, count: u32) -> Result<(), L::Error> {
    for _ in 0..count {
        link.step()?;
    }
    Ok(())
}

/// Puts `level` on an externally driven wire and holds it for `ticks` oversampling
/// ticks. Returns how many `rx_done` pulses happened meanwhile.
pub fn drive_line_for(link: &mut UartLink, level: LineLevel, ticks: u32) -> u32 {
    link.set_line(level);
    let mut seen = 0;
    let mut done_pulses = 0;
    while seen < ticks {
        let signals = link.step();
        if signals.tick {
            seen += 1;
        }
        if signals.rx_done {
            done_pulses += 1;
        }
    }
    done_pulses
}

/// Plays a complete 8N1 frame for `byte` onto an externally driven wire, with the
/// stop bit at `stop`, and leaves the line at `stop`. Returns the `rx_done` count.
pub fn drive_frame(link: &mut UartLink, byte: u8, stop: LineLevel) -> u32 {
    use crate::common::timing::{DATA_BITS, TICKS_PER_BIT};

    let mut done_pulses = drive_line_for(link, LineLevel::Low, TICKS_PER_BIT);
    for bit in 0..DATA_BITS {
        done_pulses += drive_line_for(link, LineLevel::from_lsb(byte >> bit), TICKS_PER_BIT);
    }
    done_pulses + drive_line_for(link, stop, TICKS_PER_BIT)
}

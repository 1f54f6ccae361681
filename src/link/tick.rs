// src/link/tick.rs

use crate::common::{config::LinkConfig, Divisor, UartError};

/// Divides the reference clock down to the 16x oversampling tick.
///
/// The only source of timing in the link; the framer and deframer never count
/// reference steps themselves.
#[derive(Debug, Clone)]
pub struct TickGenerator {
    divisor: Divisor,
    counter: u32,
}

impl TickGenerator {
    pub fn new(divisor: Divisor) -> Self {
        TickGenerator { divisor, counter: 0 }
    }

    /// Validates `config` and builds a generator for it.
    pub fn configure(config: LinkConfig) -> Result<Self, UartError> {
        let divisor = config.divisor()?;
        log::debug!("tick generator configured for {} ({})", config, divisor);
        Ok(Self::new(divisor))
    }

    #[inline]
    pub fn divisor(&self) -> Divisor {
        self.divisor
    }

    /// Advances by one reference step. Returns `true` on every `Divisor`-th call;
    /// the counter wraps back to 0 on the same call.
    pub fn advance_one_reference_unit(&mut self) -> bool {
        if self.counter + 1 >= self.divisor.get() {
            self.counter = 0;
            true
        } else {
            self.counter += 1;
            false
        }
    }

    /// Restarts the count so the next tick is a full `Divisor` steps away.
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

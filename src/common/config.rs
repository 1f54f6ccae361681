// src/common/config.rs

use super::error::UartError;
use super::timing::TICKS_PER_BIT;
use core::convert::TryFrom;
use core::fmt;

/// Harness-provided link configuration.
///
/// Both values are plain integers in hertz / baud. They are only checked when a
/// [`Divisor`] is derived from them, which every constructor that starts stepping
/// does first.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LinkConfig {
    reference_frequency: u32,
    symbol_rate: u32,
}

impl LinkConfig {
    pub const fn new(reference_frequency: u32, symbol_rate: u32) -> Self {
        LinkConfig { reference_frequency, symbol_rate }
    }

    #[inline]
    pub const fn reference_frequency(&self) -> u32 {
        self.reference_frequency
    }

    #[inline]
    pub const fn symbol_rate(&self) -> u32 {
        self.symbol_rate
    }

    /// Validates the configuration and computes the reference steps per tick.
    pub fn divisor(&self) -> Result<Divisor, UartError> {
        Divisor::new(self.reference_frequency, self.symbol_rate)
    }

    /// The symbol rate the truncated integer divisor actually produces.
    pub fn actual_symbol_rate(&self) -> Result<u32, UartError> {
        let divisor = self.divisor()?;
        Ok(self.reference_frequency / (divisor.get() * TICKS_PER_BIT))
    }

    /// Signed deviation of the produced rate from the requested one, in parts per million.
    ///
    /// Truncating the divisor can only shorten the tick, so the result is never negative.
    pub fn rate_error_ppm(&self) -> Result<i64, UartError> {
        let divisor = self.divisor()?;
        let produced_hz_x16 = i64::from(self.reference_frequency);
        let requested_hz_x16 =
            i64::from(self.symbol_rate) * i64::from(divisor.get()) * i64::from(TICKS_PER_BIT);
        Ok((produced_hz_x16 - requested_hz_x16) * 1_000_000 / requested_hz_x16)
    }
}

impl fmt::Display for LinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz / {} baud", self.reference_frequency, self.symbol_rate)
    }
}

/// Reference-clock steps per oversampling tick. Always at least 1.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Divisor(u32);

impl Divisor {
    /// Computes `reference_frequency / (symbol_rate * 16)`, rejecting anything below 1.
    pub fn new(reference_frequency: u32, symbol_rate: u32) -> Result<Self, UartError> {
        let invalid = UartError::InvalidConfig { reference_frequency, symbol_rate };

        // u64 so that a huge symbol rate cannot overflow the x16 product
        let tick_rate = u64::from(symbol_rate) * u64::from(TICKS_PER_BIT);
        if tick_rate == 0 {
            return Err(invalid);
        }
        let divisor = u64::from(reference_frequency) / tick_rate;
        if divisor < 1 {
            return Err(invalid);
        }
        // divisor <= reference_frequency, so it always fits back into u32
        Ok(Divisor(divisor as u32))
    }

    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<LinkConfig> for Divisor {
    type Error = UartError;

    fn try_from(value: LinkConfig) -> Result<Self, Self::Error> {
        value.divisor()
    }
}

impl From<Divisor> for u32 {
    fn from(value: Divisor) -> Self {
        value.0
    }
}

impl fmt::Display for Divisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisor_truncates() {
        // 1_000_000 / 160_000 = 6.25
        assert_eq!(Divisor::new(1_000_000, 10_000).unwrap().get(), 6);
        assert_eq!(Divisor::new(16, 1).unwrap().get(), 1);
        assert_eq!(Divisor::new(31, 1).unwrap().get(), 1);
        assert_eq!(Divisor::new(32, 1).unwrap().get(), 2);
    }

    #[test]
    fn test_divisor_rejects_slow_reference() {
        assert!(matches!(
            Divisor::new(15, 1),
            Err(UartError::InvalidConfig { reference_frequency: 15, symbol_rate: 1 })
        ));
        assert!(matches!(Divisor::new(100_000, 9600), Err(UartError::InvalidConfig { .. })));
    }

    #[test]
    fn test_divisor_rejects_zero() {
        assert!(matches!(Divisor::new(0, 9600), Err(UartError::InvalidConfig { .. })));
        assert!(matches!(Divisor::new(1_000_000, 0), Err(UartError::InvalidConfig { .. })));
    }

    #[test]
    fn test_divisor_huge_symbol_rate() {
        assert!(matches!(Divisor::new(u32::MAX, u32::MAX), Err(UartError::InvalidConfig { .. })));
        assert_eq!(Divisor::new(u32::MAX, 1).unwrap().get(), u32::MAX / 16);
    }

    #[test]
    fn test_try_from_config() {
        let config = LinkConfig::new(1_000_000, 10_000);
        assert_eq!(Divisor::try_from(config).unwrap(), Divisor(6));
        assert_eq!(u32::from(Divisor(6)), 6);
    }

    #[test]
    fn test_actual_rate_and_error() {
        let config = LinkConfig::new(1_000_000, 10_000);
        // 1_000_000 / 96 = 10_416
        assert_eq!(config.actual_symbol_rate().unwrap(), 10_416);
        // (1_000_000 - 960_000) / 960_000 = 41_666 ppm
        assert_eq!(config.rate_error_ppm().unwrap(), 41_666);

        let exact = LinkConfig::new(16_000_000, 100_000);
        assert_eq!(exact.actual_symbol_rate().unwrap(), 100_000);
        assert_eq!(exact.rate_error_ppm().unwrap(), 0);

        assert!(LinkConfig::new(10, 9600).rate_error_ppm().is_err());
    }
}

// src/bitbang/mod.rs

//! Binds a [`UartLink`] to real pins through `embedded-hal` digital traits.
//!
//! Each call to [`BitbangLink::step`] is one reference step: the RX pin is
//! sampled onto the wire, the link advances, and the framer's level is written to
//! the TX pin. Calling it at the configured reference frequency is the caller's job
//! (a timer interrupt, typically).

use crate::common::{
    hal_traits::{ByteSerial, Steppable},
    LineLevel, LinkConfig, UartError,
};
use crate::link::{LinkSignals, UartLink, Wiring};
use embedded_hal::digital::{InputPin, OutputPin};

#[derive(Debug)]
pub struct BitbangLink<TX, RX> {
    link: UartLink,
    tx: TX,
    rx: RX,
    /// Level last written to `tx`, so the pin is only touched on changes.
    tx_level: LineLevel,
}

impl<TX, RX> BitbangLink<TX, RX>
where
    TX: OutputPin,
    RX: InputPin<Error = TX::Error>,
{
    /// Validates `config`, builds an externally wired link and parks TX at idle-high.
    pub fn new(config: LinkConfig, mut tx: TX, rx: RX) -> Result<Self, UartError<TX::Error>> {
        let link = UartLink::new(config, Wiring::External).map_err(|_| UartError::InvalidConfig {
            reference_frequency: config.reference_frequency(),
            symbol_rate: config.symbol_rate(),
        })?;
        tx.set_high().map_err(UartError::Io)?;
        Ok(BitbangLink { link, tx, rx, tx_level: LineLevel::High })
    }

    /// One reference step with pin I/O on both sides.
    pub fn step(&mut self) -> Result<LinkSignals, TX::Error> {
        let rx_level = LineLevel::from(self.rx.is_high()?);
        self.link.set_line(rx_level);

        let signals = self.link.step();

        let tx_level = self.link.tx_line();
        if tx_level != self.tx_level {
            match tx_level {
                LineLevel::High => self.tx.set_high()?,
                LineLevel::Low => self.tx.set_low()?,
            }
            self.tx_level = tx_level;
        }
        Ok(signals)
    }

    pub fn start_send(&mut self, byte: u8) -> Result<(), UartError<TX::Error>> {
        self.link.start_send(byte).map_err(|_| UartError::Busy)
    }

    /// Resets the link and drives TX back to idle-high.
    pub fn reset(&mut self) -> Result<(), TX::Error> {
        self.link.reset();
        self.tx.set_high()?;
        self.tx_level = LineLevel::High;
        Ok(())
    }

    pub fn link(&self) -> &UartLink {
        &self.link
    }

    /// Gives the pins back.
    pub fn release(self) -> (TX, RX) {
        (self.tx, self.rx)
    }
}

impl<TX, RX> ByteSerial for BitbangLink<TX, RX>
where
    TX: OutputPin,
    RX: InputPin<Error = TX::Error>,
{
    type Error = TX::Error;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        self.link.read_byte().map_err(|_| nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        self.link.write_byte(byte).map_err(|_| nb::Error::WouldBlock)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.link.flush().map_err(|_| nb::Error::WouldBlock)
    }
}

impl<TX, RX> Steppable for BitbangLink<TX, RX>
where
    TX: OutputPin,
    RX: InputPin<Error = TX::Error>,
{
    type Error = TX::Error;

    fn step(&mut self) -> Result<(), Self::Error> {
        BitbangLink::step(self).map(|_| ())
    }
}

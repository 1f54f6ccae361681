// src/common/frame.rs

use super::timing::{BITS_PER_FRAME, DATA_BITS};

/// Serial frame formats the link can put on the wire.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum FrameFormat {
    /// 8 data bits, no parity, 1 stop bit.
    #[default]
    Uart8N1,
}

impl FrameFormat {
    pub const fn data_bits(&self) -> u8 {
        match self {
            FrameFormat::Uart8N1 => DATA_BITS,
        }
    }

    /// Bit periods per frame, framing bits included.
    pub const fn bit_periods(&self) -> u32 {
        match self {
            FrameFormat::Uart8N1 => BITS_PER_FRAME,
        }
    }
}

/// Logic level of the single wire. The idle (mark) level is `High`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum LineLevel {
    Low,
    #[default]
    High,
}

impl LineLevel {
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, LineLevel::High)
    }

    #[inline]
    pub const fn is_low(self) -> bool {
        matches!(self, LineLevel::Low)
    }

    /// Level of data bit 0 of `byte`.
    #[inline]
    pub const fn from_lsb(byte: u8) -> Self {
        if byte & 1 == 1 { LineLevel::High } else { LineLevel::Low }
    }
}

impl From<bool> for LineLevel {
    fn from(value: bool) -> Self {
        if value { LineLevel::High } else { LineLevel::Low }
    }
}

impl From<LineLevel> for bool {
    fn from(value: LineLevel) -> Self {
        value.is_high()
    }
}

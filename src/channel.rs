use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque identifier of an open adapter channel. Allocated by the adapter;
/// the tester never generates one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(u8);

impl ChannelHandle {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u8 {
        self.0
    }
}

impl From<u8> for ChannelHandle {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl From<ChannelHandle> for u8 {
    fn from(handle: ChannelHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Opaque identifier of a periodic message scheduled on the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodicMessageHandle(u8);

impl PeriodicMessageHandle {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u8 {
        self.0
    }
}

impl From<u8> for PeriodicMessageHandle {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl From<PeriodicMessageHandle> for u8 {
    fn from(handle: PeriodicMessageHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for PeriodicMessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Bus protocol an adapter channel is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ChannelProtocol {
    /// Unframed CAN passthrough
    #[strum(to_string = "raw CAN")]
    Raw = 0x00,
    /// ISO 15765-2 transport on CAN
    #[strum(to_string = "ISO-TP")]
    IsoTp = 0x01,
    #[strum(to_string = "ISO 9141-2")]
    Iso9141 = 0x02,
    #[strum(to_string = "KWP 2000")]
    Kwp2000 = 0x03,
}

use crate::constants::ARBITRATION_WIRE_SIZE;
use crate::error::ProtocolError;
use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wire layout of a CAN arbitration record, 14 bytes big-endian.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ArbitrationRaw {
    pub request: U32,
    pub request_extension: u8,
    pub reply_pattern: U32,
    pub reply_mask: U32,
    pub reply_extension: u8,
}

/// A CAN arbitration descriptor: which id a diagnostic request goes out
/// under, and which incoming ids count as its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Arbitration {
    /// 29-bit CAN id padded to 32 bits
    pub request: u32,
    /// ISO-TP extended-addressing byte, 0 when unused
    pub request_extension: u8,
    /// Expected reply id bits
    pub reply_pattern: u32,
    /// 1s where pattern bits are significant
    pub reply_mask: u32,
    pub reply_extension: u8,
}

impl Arbitration {
    pub fn new(request: u32, reply_pattern: u32, reply_mask: u32) -> Self {
        Self {
            request,
            request_extension: 0,
            reply_pattern,
            reply_mask,
            reply_extension: 0,
        }
    }

    /// Serialize to the 14-byte wire representation.
    pub fn to_wire(&self) -> [u8; ARBITRATION_WIRE_SIZE] {
        let raw = ArbitrationRaw::from(*self);
        let mut out = [0u8; ARBITRATION_WIRE_SIZE];
        out.copy_from_slice(raw.as_bytes());
        out
    }

    /// Deserialize from exactly 14 wire bytes.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let raw = ArbitrationRaw::read_from_bytes(bytes).map_err(|_| {
            ProtocolError::InsufficientData {
                expected: ARBITRATION_WIRE_SIZE,
                actual: bytes.len(),
            }
        })?;
        Ok(raw.into())
    }
}

impl From<ArbitrationRaw> for Arbitration {
    fn from(raw: ArbitrationRaw) -> Self {
        Self {
            request: raw.request.get(),
            request_extension: raw.request_extension,
            reply_pattern: raw.reply_pattern.get(),
            reply_mask: raw.reply_mask.get(),
            reply_extension: raw.reply_extension,
        }
    }
}

impl From<Arbitration> for ArbitrationRaw {
    fn from(arb: Arbitration) -> Self {
        Self {
            request: U32::new(arb.request),
            request_extension: arb.request_extension,
            reply_pattern: U32::new(arb.reply_pattern),
            reply_mask: U32::new(arb.reply_mask),
            reply_extension: arb.reply_extension,
        }
    }
}

//! CANyonero PDU framing
//!
//! Every message on the tester<->adapter link is a PDU: the fixed ATT
//! preamble `0x1A`, a type byte, a 16-bit big-endian payload length, and
//! the payload itself. Type values are partitioned into tester->adapter
//! commands (`0x01..=0x1F`), adapter->tester replies (`0x40..=0x5F`), and
//! error replies (`0xE0..=0xEF`).
//!
//! [`RawPdu`] is the framing layer: a validated type byte plus an opaque
//! payload. The typed view with per-variant payload layouts lives in
//! [`crate::message::Pdu`].

use crate::constants::{ATT, MAX_PDU_PAYLOAD, PDU_HEADER_SIZE};
use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// CANyonero PDU type codes as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PduType {
    // tester -> adapter
    Ping = 0x01,
    RequestInfo = 0x02,
    ReadVoltage = 0x03,
    OpenChannel = 0x04,
    CloseChannel = 0x05,
    Send = 0x06,
    SetArbitration = 0x07,
    StartPeriodicMessage = 0x08,
    EndPeriodicMessage = 0x09,
    PrepareForUpdate = 0x0A,
    SendUpdateData = 0x0B,
    CommitUpdate = 0x0C,
    Reset = 0x0D,

    // adapter -> tester
    Pong = 0x40,
    Info = 0x41,
    Voltage = 0x42,
    ChannelOpened = 0x43,
    ChannelClosed = 0x44,
    Sent = 0x45,
    ArbitrationSet = 0x46,
    PeriodicMessageStarted = 0x47,
    PeriodicMessageEnded = 0x48,
    UpdateStartedSendData = 0x49,
    UpdateDataReceived = 0x4A,
    UpdateCompleted = 0x4B,
    Resetting = 0x4C,

    // adapter -> tester, error replies
    ErrorUnspecified = 0xE0,
    ErrorHardware = 0xE1,
    ErrorInvalidChannel = 0xE2,
    ErrorInvalidPeriodic = 0xE3,
    ErrorNoResponse = 0xE4,
    ErrorInvalidCommand = 0xEF,
}

impl PduType {
    /// Tester->adapter command range.
    pub fn is_command(&self) -> bool {
        let value: u8 = (*self).into();
        (0x01..0x20).contains(&value)
    }

    /// Adapter->tester reply range, errors excluded.
    pub fn is_reply(&self) -> bool {
        let value: u8 = (*self).into();
        (0x40..0x60).contains(&value)
    }

    /// Adapter->tester error range.
    pub fn is_error(&self) -> bool {
        let value: u8 = (*self).into();
        value >= 0xE0
    }
}

/// A framed PDU: validated type byte plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPdu {
    pdu_type: PduType,
    payload: Bytes,
}

impl RawPdu {
    /// Create a PDU, rejecting payloads that do not fit the 16-bit length
    /// field.
    pub fn new(pdu_type: PduType, payload: Bytes) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PDU_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge { len: payload.len() });
        }
        Ok(Self { pdu_type, payload })
    }

    pub fn pdu_type(&self) -> PduType {
        self.pdu_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Check whether `buffer` starts with one complete PDU.
    ///
    /// Returns the total frame length when the header and the declared
    /// payload are fully present, `None` while more bytes are needed.
    /// No type or preamble validation happens here; feed the returned
    /// prefix to the decoder for that. The caller must be aligned on a
    /// PDU boundary.
    pub fn probe(buffer: &[u8]) -> Option<usize> {
        if buffer.len() < PDU_HEADER_SIZE {
            return None;
        }
        let declared = u16::from_be_bytes([buffer[2], buffer[3]]) as usize;
        let total = PDU_HEADER_SIZE + declared;
        (buffer.len() >= total).then_some(total)
    }
}

impl TryFrom<Bytes> for RawPdu {
    type Error = ProtocolError;

    fn try_from(mut bytes: Bytes) -> Result<Self, Self::Error> {
        if bytes.len() < PDU_HEADER_SIZE {
            return Err(ProtocolError::InsufficientData {
                expected: PDU_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] != ATT {
            return Err(ProtocolError::BadPreamble { found: bytes[0] });
        }
        let pdu_type = PduType::try_from(bytes[1]).map_err(|_| ProtocolError::UnknownType(bytes[1]))?;
        let declared = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        if bytes.len() != PDU_HEADER_SIZE + declared {
            return Err(ProtocolError::LengthMismatch {
                declared,
                actual: bytes.len() - PDU_HEADER_SIZE,
            });
        }
        let payload = bytes.split_off(PDU_HEADER_SIZE);
        Ok(Self { pdu_type, payload })
    }
}

impl TryFrom<&[u8]> for RawPdu {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from(Bytes::copy_from_slice(bytes))
    }
}

impl From<RawPdu> for Bytes {
    fn from(pdu: RawPdu) -> Self {
        let mut out = BytesMut::with_capacity(PDU_HEADER_SIZE + pdu.payload.len());
        out.put_u8(ATT);
        out.put_u8(pdu.pdu_type.into());
        out.put_u16(pdu.payload.len() as u16);
        out.extend_from_slice(&pdu.payload);
        out.freeze()
    }
}

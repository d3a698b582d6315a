use crate::pdu::PduType;
use thiserror::Error;

/// The primary error type for the `canyonero` library.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Payload of {len} bytes exceeds the 16-bit PDU length field")]
    PayloadTooLarge { len: usize },

    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Bad preamble: expected the ATT byte 0x1a, found {found:#04x}")]
    BadPreamble { found: u8 },

    #[error("Unknown PDU type {0:#04x}")]
    UnknownType(u8),

    #[error("Length mismatch: header declares {declared} payload bytes, frame carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Requested {requested} from a {found:?} PDU that does not carry one")]
    WrongType {
        requested: &'static str,
        found: PduType,
    },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

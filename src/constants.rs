// Wire constants for the CANyonero tester<->adapter link

/// Attention byte, the fixed preamble of every PDU (0x1A)
pub const ATT: u8 = 0x1A;

/// Size of the PDU header: preamble, type, 16-bit payload length (4 bytes)
pub const PDU_HEADER_SIZE: usize = 4;

/// Maximum PDU payload length, limited by the 16-bit length field
pub const MAX_PDU_PAYLOAD: usize = 0xFFFF;

/// Serialized size of a CAN arbitration record (14 bytes)
pub const ARBITRATION_WIRE_SIZE: usize = 14;

/// Size of a K-Line frame header, both ISO 9141-2 and KWP 2000 (3 bytes)
pub const KLINE_HEADER_SIZE: usize = 3;

/// Minimum size of a valid K-Line frame: header, one data byte, checksum
pub const MIN_KLINE_FRAME: usize = 4;

/// ISO 9141-2 header target byte
pub const ISO9141_TARGET: u8 = 0x48;

/// ISO 9141-2 header key byte
pub const ISO9141_KEY_BYTE: u8 = 0x6B;

/// Maximum ISO 9141-2 data length, keeping the whole frame within 256 bytes
pub const ISO9141_MAX_DATA: usize = 252;

/// Address-mode flag in the KWP 2000 format byte
pub const KWP_FORMAT_FLAG: u8 = 0x80;

/// Mask for the data length carried in the KWP 2000 format byte
pub const KWP_LENGTH_MASK: u8 = 0x3F;

/// Low-nibble length mask used by the adapter firmware when re-splitting
/// concatenated KWP frames
pub const KWP_SHORT_LENGTH_MASK: u8 = 0x0F;

/// Maximum KWP 2000 data length, limited by the format byte's length field
pub const KWP_MAX_DATA: usize = 63;

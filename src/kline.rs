//! K-Line frame construction and splitting
//!
//! Two frame layouts travel on the K-Line:
//!
//! - ISO 9141-2: `[0x48, 0x6B, source, data.., checksum]`
//! - KWP 2000:   `[0x80|len, target, source, data.., checksum]`
//!
//! The checksum is always the modulo-256 sum of all preceding bytes. Large
//! KWP payloads are split across frames, each re-emitting the payload's
//! service/identifier prefix followed by a 1-based sequence index.

use crate::constants::{
    ISO9141_KEY_BYTE, ISO9141_MAX_DATA, ISO9141_TARGET, KLINE_HEADER_SIZE, KWP_FORMAT_FLAG,
    KWP_LENGTH_MASK, KWP_MAX_DATA, KWP_SHORT_LENGTH_MASK,
};
use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The two K-Line protocol variants an adapter channel can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KLineMode {
    #[strum(to_string = "ISO 9141-2")]
    Iso9141,
    #[strum(to_string = "KWP 2000")]
    Kwp,
}

/// Which bits of the KWP format byte carry the data length when splitting
/// a concatenated stream.
///
/// The adapter firmware reads only the low nibble, so frames with 16 or
/// more data bytes are mis-split under that rule; ISO 14230 defines the
/// length as the low six bits. `LowNibble` reproduces the firmware
/// behaviour and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KwpLengthField {
    #[default]
    LowNibble,
    LowSixBits,
}

impl KwpLengthField {
    fn mask(self) -> u8 {
        match self {
            KwpLengthField::LowNibble => KWP_SHORT_LENGTH_MASK,
            KwpLengthField::LowSixBits => KWP_LENGTH_MASK,
        }
    }
}

/// Modulo-256 sum, the trailing checksum of every K-Line frame.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Build an ISO 9141-2 frame with the standard `0x48 0x6B` header.
pub fn build_iso9141(source: u8, data: &[u8]) -> Result<Bytes, ProtocolError> {
    build_iso9141_addressed(ISO9141_TARGET, ISO9141_KEY_BYTE, source, data)
}

/// Build an ISO 9141-2 frame with explicit header target and key bytes.
pub fn build_iso9141_addressed(
    target: u8,
    key_byte: u8,
    source: u8,
    data: &[u8],
) -> Result<Bytes, ProtocolError> {
    if data.len() > ISO9141_MAX_DATA {
        return Err(ProtocolError::InvalidFrame(format!(
            "ISO 9141 data length {} exceeds {ISO9141_MAX_DATA}",
            data.len()
        )));
    }
    let mut frame = BytesMut::with_capacity(KLINE_HEADER_SIZE + data.len() + 1);
    frame.put_u8(target);
    frame.put_u8(key_byte);
    frame.put_u8(source);
    frame.extend_from_slice(data);
    let cks = checksum(&frame);
    frame.put_u8(cks);
    Ok(frame.freeze())
}

/// Build a single KWP 2000 frame. `data` must fit the format byte's
/// six-bit length field.
pub fn build_kwp_single(source: u8, target: u8, data: &[u8]) -> Result<Bytes, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::InvalidFrame(
            "KWP frame requires at least one data byte".to_string(),
        ));
    }
    if data.len() > KWP_MAX_DATA {
        return Err(ProtocolError::InvalidFrame(format!(
            "KWP data length {} exceeds {KWP_MAX_DATA}",
            data.len()
        )));
    }
    let mut frame = BytesMut::with_capacity(KLINE_HEADER_SIZE + data.len() + 1);
    frame.put_u8(KWP_FORMAT_FLAG | data.len() as u8);
    frame.put_u8(target);
    frame.put_u8(source);
    frame.extend_from_slice(data);
    let cks = checksum(&frame);
    frame.put_u8(cks);
    Ok(frame.freeze())
}

/// Split a logical payload across KWP 2000 frames.
///
/// The payload's leading service and identifier bytes are re-emitted on
/// every frame, followed by a 1-based sequence index; each frame then
/// carries up to `per_frame_data_bytes` bytes of the remaining payload.
/// The receiving side merges the frames back by stripping the repeated
/// prefix and the sequence indices.
pub fn build_kwp_multi(
    source: u8,
    target: u8,
    payload: &[u8],
    service_id: u8,
    per_frame_data_bytes: usize,
) -> Result<Vec<Bytes>, ProtocolError> {
    if payload.len() < 3 {
        return Err(ProtocolError::InvalidFrame(
            "Multi-frame payload requires a service/identifier prefix and data".to_string(),
        ));
    }
    if per_frame_data_bytes == 0 {
        return Err(ProtocolError::InvalidFrame(
            "Per-frame data byte count must be at least 1".to_string(),
        ));
    }
    if KLINE_HEADER_SIZE + per_frame_data_bytes > KWP_MAX_DATA {
        return Err(ProtocolError::InvalidFrame(format!(
            "Per-frame data byte count {per_frame_data_bytes} does not fit a KWP frame"
        )));
    }
    let identifier = payload[1];
    let chunks = payload[2..].chunks(per_frame_data_bytes);
    if chunks.len() > u8::MAX as usize {
        return Err(ProtocolError::InvalidFrame(format!(
            "Payload spans {} frames, the sequence index is a single byte",
            chunks.len()
        )));
    }
    let mut frames = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.enumerate() {
        let mut data = Vec::with_capacity(3 + chunk.len());
        data.push(service_id);
        data.push(identifier);
        data.push(index as u8 + 1);
        data.extend_from_slice(chunk);
        frames.push(build_kwp_single(source, target, &data)?);
    }
    Ok(frames)
}

/// Partition a concatenated byte stream into individual K-Line frames
/// using the default KWP length rule (low nibble, as the adapter firmware
/// does).
pub fn split_frames(buffer: &[u8], mode: KLineMode) -> Vec<Bytes> {
    split_frames_with(buffer, mode, KwpLengthField::default())
}

/// Partition a concatenated byte stream into individual K-Line frames.
///
/// ISO 9141 responses carry no intra-frame boundary, so the whole buffer
/// is one frame; the caller's buffering and timing pre-chunk the stream.
/// KWP frames declare their length in the format byte and are walked
/// accordingly. A trailing remainder shorter than its declared length is
/// returned as the final frame, for the transceiver to reject.
pub fn split_frames_with(buffer: &[u8], mode: KLineMode, length_field: KwpLengthField) -> Vec<Bytes> {
    if buffer.is_empty() {
        return Vec::new();
    }
    match mode {
        KLineMode::Iso9141 => vec![Bytes::copy_from_slice(buffer)],
        KLineMode::Kwp => {
            let mask = length_field.mask();
            let mut frames = Vec::new();
            let mut offset = 0;
            while offset < buffer.len() {
                let data_len = (buffer[offset] & mask) as usize;
                let end = (offset + KLINE_HEADER_SIZE + data_len + 1).min(buffer.len());
                frames.push(Bytes::copy_from_slice(&buffer[offset..end]));
                offset = end;
            }
            frames
        }
    }
}

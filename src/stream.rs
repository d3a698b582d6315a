//! Incremental framing of PDUs on a byte stream
//!
//! Transports deliver PDUs back to back and in arbitrary read sizes. The
//! assembler buffers whatever arrives and carves complete PDUs off the
//! head, so a network reader never has to block on frame boundaries.

use crate::error::ProtocolError;
use crate::message::Pdu;
use crate::pdu::RawPdu;
use bytes::BytesMut;
use tracing::trace;

/// Reassembles PDUs from a stream of transport reads.
///
/// `push` whatever the transport delivered, then drain with [`next_raw`]
/// or [`next_pdu`] until they report that no complete PDU is buffered.
/// On a decode error the offending frame has already been consumed, so the
/// caller may keep draining from the next PDU boundary.
///
/// [`next_raw`]: PduAssembler::next_raw
/// [`next_pdu`]: PduAssembler::next_pdu
#[derive(Debug, Default)]
pub struct PduAssembler {
    buffer: BytesMut,
}

impl PduAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes received from the transport.
    pub fn push(&mut self, bytes: &[u8]) {
        trace!("rx [{} bytes]: {:02x?}", bytes.len(), bytes);
        self.buffer.extend_from_slice(bytes);
    }

    /// Carve the next complete PDU off the head of the buffer.
    ///
    /// Returns `Ok(None)` while the buffered bytes do not yet hold one
    /// complete PDU.
    pub fn next_raw(&mut self) -> Result<Option<RawPdu>, ProtocolError> {
        let Some(length) = RawPdu::probe(&self.buffer) else {
            return Ok(None);
        };
        let frame = self.buffer.split_to(length).freeze();
        Ok(Some(RawPdu::try_from(frame)?))
    }

    /// Like [`next_raw`], but parsed into the typed [`Pdu`] view.
    ///
    /// [`next_raw`]: PduAssembler::next_raw
    pub fn next_pdu(&mut self) -> Result<Option<Pdu>, ProtocolError> {
        match self.next_raw()? {
            Some(raw) => Ok(Some(raw.try_into()?)),
            None => Ok(None),
        }
    }

    /// Number of buffered bytes not yet consumed.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drop all buffered bytes, e.g. after a transport reconnect.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

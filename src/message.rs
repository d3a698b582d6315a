//! Typed view of the CANyonero PDUs
//!
//! [`Pdu`] carries one variant per wire type with the payload already
//! parsed into fields. Encoding and decoding go through [`RawPdu`], so the
//! framing invariants live in one place and this module only deals with
//! per-variant payload layouts.

use crate::arbitration::Arbitration;
use crate::channel::{ChannelHandle, ChannelProtocol, PeriodicMessageHandle};
use crate::constants::ARBITRATION_WIRE_SIZE;
use crate::error::ProtocolError;
use crate::pdu::{PduType, RawPdu};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Adapter identification as reported by an `Info` reply: five
/// newline-separated fields, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdapterInfo {
    pub vendor: String,
    pub model: String,
    pub hardware: String,
    pub serial: String,
    pub firmware: String,
}

impl AdapterInfo {
    fn fields(&self) -> [&str; 5] {
        [
            &self.vendor,
            &self.model,
            &self.hardware,
            &self.serial,
            &self.firmware,
        ]
    }

    fn to_payload(&self) -> Result<Bytes, ProtocolError> {
        if self.fields().iter().any(|field| field.contains('\n')) {
            return Err(ProtocolError::InvalidPayload(
                "Info fields must not contain newlines".to_string(),
            ));
        }
        Ok(Bytes::from(self.fields().join("\n").into_bytes()))
    }

    fn from_payload(payload: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| ProtocolError::InvalidPayload("Info fields are not valid UTF-8".to_string()))?;
        let fields: Vec<&str> = text.split('\n').collect();
        if fields.len() != 5 {
            return Err(ProtocolError::InvalidPayload(format!(
                "Info payload carries {} fields, expected 5",
                fields.len()
            )));
        }
        Ok(Self {
            vendor: fields[0].to_string(),
            model: fields[1].to_string(),
            hardware: fields[2].to_string(),
            serial: fields[3].to_string(),
            firmware: fields[4].to_string(),
        })
    }
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (hw {}, fw {}, serial {})",
            self.vendor, self.model, self.hardware, self.firmware, self.serial
        )
    }
}

/// One CANyonero PDU with its payload parsed into typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pdu {
    // tester -> adapter
    /// Link liveness probe carrying an opaque payload the adapter echoes back
    Ping(Bytes),
    RequestInfo,
    ReadVoltage,
    OpenChannel(ChannelProtocol),
    CloseChannel(ChannelHandle),
    Send {
        channel: ChannelHandle,
        data: Bytes,
    },
    SetArbitration {
        channel: ChannelHandle,
        arbitration: Arbitration,
    },
    /// Schedule `data` for re-emission every `interval` ticks until ended.
    /// The tick duration is defined by the adapter firmware.
    StartPeriodicMessage {
        interval: u8,
        arbitration: Arbitration,
        data: Bytes,
    },
    EndPeriodicMessage(PeriodicMessageHandle),
    PrepareForUpdate,
    SendUpdateData(Bytes),
    CommitUpdate,
    Reset,

    // adapter -> tester
    Pong(Bytes),
    Info(AdapterInfo),
    Voltage {
        millivolts: u16,
    },
    ChannelOpened(ChannelHandle),
    ChannelClosed(ChannelHandle),
    Sent {
        channel: ChannelHandle,
        count: u16,
    },
    ArbitrationSet,
    PeriodicMessageStarted(PeriodicMessageHandle),
    PeriodicMessageEnded(PeriodicMessageHandle),
    UpdateStartedSendData,
    UpdateDataReceived,
    UpdateCompleted,
    Resetting,

    // adapter -> tester, error replies
    ErrorUnspecified,
    ErrorHardware,
    ErrorInvalidChannel,
    ErrorInvalidPeriodic,
    ErrorNoResponse,
    ErrorInvalidCommand,
}

impl Pdu {
    pub fn pdu_type(&self) -> PduType {
        match self {
            Pdu::Ping(_) => PduType::Ping,
            Pdu::RequestInfo => PduType::RequestInfo,
            Pdu::ReadVoltage => PduType::ReadVoltage,
            Pdu::OpenChannel(_) => PduType::OpenChannel,
            Pdu::CloseChannel(_) => PduType::CloseChannel,
            Pdu::Send { .. } => PduType::Send,
            Pdu::SetArbitration { .. } => PduType::SetArbitration,
            Pdu::StartPeriodicMessage { .. } => PduType::StartPeriodicMessage,
            Pdu::EndPeriodicMessage(_) => PduType::EndPeriodicMessage,
            Pdu::PrepareForUpdate => PduType::PrepareForUpdate,
            Pdu::SendUpdateData(_) => PduType::SendUpdateData,
            Pdu::CommitUpdate => PduType::CommitUpdate,
            Pdu::Reset => PduType::Reset,
            Pdu::Pong(_) => PduType::Pong,
            Pdu::Info(_) => PduType::Info,
            Pdu::Voltage { .. } => PduType::Voltage,
            Pdu::ChannelOpened(_) => PduType::ChannelOpened,
            Pdu::ChannelClosed(_) => PduType::ChannelClosed,
            Pdu::Sent { .. } => PduType::Sent,
            Pdu::ArbitrationSet => PduType::ArbitrationSet,
            Pdu::PeriodicMessageStarted(_) => PduType::PeriodicMessageStarted,
            Pdu::PeriodicMessageEnded(_) => PduType::PeriodicMessageEnded,
            Pdu::UpdateStartedSendData => PduType::UpdateStartedSendData,
            Pdu::UpdateDataReceived => PduType::UpdateDataReceived,
            Pdu::UpdateCompleted => PduType::UpdateCompleted,
            Pdu::Resetting => PduType::Resetting,
            Pdu::ErrorUnspecified => PduType::ErrorUnspecified,
            Pdu::ErrorHardware => PduType::ErrorHardware,
            Pdu::ErrorInvalidChannel => PduType::ErrorInvalidChannel,
            Pdu::ErrorInvalidPeriodic => PduType::ErrorInvalidPeriodic,
            Pdu::ErrorNoResponse => PduType::ErrorNoResponse,
            Pdu::ErrorInvalidCommand => PduType::ErrorInvalidCommand,
        }
    }

    /// Lower to the framing layer. Fails only when a payload exceeds the
    /// 16-bit length field.
    pub fn to_raw(&self) -> Result<RawPdu, ProtocolError> {
        let payload = match self {
            Pdu::Ping(data) | Pdu::Pong(data) | Pdu::SendUpdateData(data) => data.clone(),
            Pdu::RequestInfo
            | Pdu::ReadVoltage
            | Pdu::PrepareForUpdate
            | Pdu::CommitUpdate
            | Pdu::Reset
            | Pdu::ArbitrationSet
            | Pdu::UpdateStartedSendData
            | Pdu::UpdateDataReceived
            | Pdu::UpdateCompleted
            | Pdu::Resetting
            | Pdu::ErrorUnspecified
            | Pdu::ErrorHardware
            | Pdu::ErrorInvalidChannel
            | Pdu::ErrorInvalidPeriodic
            | Pdu::ErrorNoResponse
            | Pdu::ErrorInvalidCommand => Bytes::new(),
            Pdu::OpenChannel(protocol) => {
                let byte: u8 = (*protocol).into();
                Bytes::copy_from_slice(&[byte])
            }
            Pdu::CloseChannel(handle) => Bytes::copy_from_slice(&[handle.raw()]),
            Pdu::ChannelOpened(handle) | Pdu::ChannelClosed(handle) => {
                Bytes::copy_from_slice(&[handle.raw()])
            }
            Pdu::EndPeriodicMessage(handle)
            | Pdu::PeriodicMessageStarted(handle)
            | Pdu::PeriodicMessageEnded(handle) => Bytes::copy_from_slice(&[handle.raw()]),
            Pdu::Send { channel, data } => {
                let mut out = BytesMut::with_capacity(1 + data.len());
                out.put_u8(channel.raw());
                out.extend_from_slice(data);
                out.freeze()
            }
            Pdu::SetArbitration {
                channel,
                arbitration,
            } => {
                let mut out = BytesMut::with_capacity(1 + ARBITRATION_WIRE_SIZE);
                out.put_u8(channel.raw());
                out.extend_from_slice(&arbitration.to_wire());
                out.freeze()
            }
            Pdu::StartPeriodicMessage {
                interval,
                arbitration,
                data,
            } => {
                let mut out = BytesMut::with_capacity(1 + ARBITRATION_WIRE_SIZE + data.len());
                out.put_u8(*interval);
                out.extend_from_slice(&arbitration.to_wire());
                out.extend_from_slice(data);
                out.freeze()
            }
            Pdu::Info(info) => info.to_payload()?,
            Pdu::Voltage { millivolts } => {
                let mut out = BytesMut::with_capacity(2);
                out.put_u16(*millivolts);
                out.freeze()
            }
            Pdu::Sent { channel, count } => {
                let mut out = BytesMut::with_capacity(3);
                out.put_u8(channel.raw());
                out.put_u16(*count);
                out.freeze()
            }
        };
        RawPdu::new(self.pdu_type(), payload)
    }

    /// Encode to the wire representation.
    pub fn to_bytes(&self) -> Result<Bytes, ProtocolError> {
        Ok(self.to_raw()?.into())
    }

    /// The channel handle, for variants whose layout carries one.
    pub fn channel(&self) -> Result<ChannelHandle, ProtocolError> {
        match self {
            Pdu::CloseChannel(handle) | Pdu::ChannelOpened(handle) | Pdu::ChannelClosed(handle) => {
                Ok(*handle)
            }
            Pdu::Send { channel, .. }
            | Pdu::SetArbitration { channel, .. }
            | Pdu::Sent { channel, .. } => Ok(*channel),
            other => Err(ProtocolError::WrongType {
                requested: "channel handle",
                found: other.pdu_type(),
            }),
        }
    }

    /// The periodic message handle, for variants whose layout carries one.
    pub fn periodic_message(&self) -> Result<PeriodicMessageHandle, ProtocolError> {
        match self {
            Pdu::EndPeriodicMessage(handle)
            | Pdu::PeriodicMessageStarted(handle)
            | Pdu::PeriodicMessageEnded(handle) => Ok(*handle),
            other => Err(ProtocolError::WrongType {
                requested: "periodic message handle",
                found: other.pdu_type(),
            }),
        }
    }

    /// The arbitration record, for variants whose layout carries one.
    pub fn arbitration(&self) -> Result<&Arbitration, ProtocolError> {
        match self {
            Pdu::SetArbitration { arbitration, .. }
            | Pdu::StartPeriodicMessage { arbitration, .. } => Ok(arbitration),
            other => Err(ProtocolError::WrongType {
                requested: "arbitration record",
                found: other.pdu_type(),
            }),
        }
    }

    /// The opaque data bytes, for variants whose layout carries some. On
    /// `Send` this is the payload after the handle byte, on
    /// `SendUpdateData` the full payload.
    pub fn data_slice(&self) -> Result<&[u8], ProtocolError> {
        match self {
            Pdu::Ping(data) | Pdu::Pong(data) | Pdu::SendUpdateData(data) => Ok(data),
            Pdu::Send { data, .. } | Pdu::StartPeriodicMessage { data, .. } => Ok(data),
            other => Err(ProtocolError::WrongType {
                requested: "data",
                found: other.pdu_type(),
            }),
        }
    }
}

fn expect_exact(pdu_type: PduType, payload: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if payload.len() != expected {
        return Err(ProtocolError::InvalidPayload(format!(
            "{pdu_type:?} payload must be {expected} bytes, got {}",
            payload.len()
        )));
    }
    Ok(())
}

fn expect_at_least(pdu_type: PduType, payload: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if payload.len() < expected {
        return Err(ProtocolError::InvalidPayload(format!(
            "{pdu_type:?} payload must be at least {expected} bytes, got {}",
            payload.len()
        )));
    }
    Ok(())
}

impl TryFrom<RawPdu> for Pdu {
    type Error = ProtocolError;

    fn try_from(raw: RawPdu) -> Result<Self, Self::Error> {
        let pdu_type = raw.pdu_type();
        let payload = raw.into_payload();
        let pdu = match pdu_type {
            PduType::Ping => Pdu::Ping(payload),
            PduType::Pong => Pdu::Pong(payload),
            PduType::SendUpdateData => Pdu::SendUpdateData(payload),
            PduType::RequestInfo => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::RequestInfo
            }
            PduType::ReadVoltage => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::ReadVoltage
            }
            PduType::OpenChannel => {
                expect_exact(pdu_type, &payload, 1)?;
                let protocol = ChannelProtocol::try_from(payload[0]).map_err(|_| {
                    ProtocolError::InvalidPayload(format!(
                        "Unknown channel protocol {:#04x}",
                        payload[0]
                    ))
                })?;
                Pdu::OpenChannel(protocol)
            }
            PduType::CloseChannel => {
                expect_exact(pdu_type, &payload, 1)?;
                Pdu::CloseChannel(ChannelHandle::new(payload[0]))
            }
            PduType::Send => {
                expect_at_least(pdu_type, &payload, 1)?;
                Pdu::Send {
                    channel: ChannelHandle::new(payload[0]),
                    data: payload.slice(1..),
                }
            }
            PduType::SetArbitration => {
                expect_exact(pdu_type, &payload, 1 + ARBITRATION_WIRE_SIZE)?;
                Pdu::SetArbitration {
                    channel: ChannelHandle::new(payload[0]),
                    arbitration: Arbitration::from_wire(&payload[1..])?,
                }
            }
            PduType::StartPeriodicMessage => {
                expect_at_least(pdu_type, &payload, 1 + ARBITRATION_WIRE_SIZE)?;
                Pdu::StartPeriodicMessage {
                    interval: payload[0],
                    arbitration: Arbitration::from_wire(&payload[1..1 + ARBITRATION_WIRE_SIZE])?,
                    data: payload.slice(1 + ARBITRATION_WIRE_SIZE..),
                }
            }
            PduType::EndPeriodicMessage => {
                expect_exact(pdu_type, &payload, 1)?;
                Pdu::EndPeriodicMessage(PeriodicMessageHandle::new(payload[0]))
            }
            PduType::PrepareForUpdate => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::PrepareForUpdate
            }
            PduType::CommitUpdate => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::CommitUpdate
            }
            PduType::Reset => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::Reset
            }
            PduType::Info => Pdu::Info(AdapterInfo::from_payload(&payload)?),
            PduType::Voltage => {
                expect_exact(pdu_type, &payload, 2)?;
                Pdu::Voltage {
                    millivolts: u16::from_be_bytes([payload[0], payload[1]]),
                }
            }
            PduType::ChannelOpened => {
                expect_exact(pdu_type, &payload, 1)?;
                Pdu::ChannelOpened(ChannelHandle::new(payload[0]))
            }
            PduType::ChannelClosed => {
                expect_exact(pdu_type, &payload, 1)?;
                Pdu::ChannelClosed(ChannelHandle::new(payload[0]))
            }
            PduType::Sent => {
                expect_exact(pdu_type, &payload, 3)?;
                Pdu::Sent {
                    channel: ChannelHandle::new(payload[0]),
                    count: u16::from_be_bytes([payload[1], payload[2]]),
                }
            }
            PduType::ArbitrationSet => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::ArbitrationSet
            }
            PduType::PeriodicMessageStarted => {
                expect_exact(pdu_type, &payload, 1)?;
                Pdu::PeriodicMessageStarted(PeriodicMessageHandle::new(payload[0]))
            }
            PduType::PeriodicMessageEnded => {
                expect_exact(pdu_type, &payload, 1)?;
                Pdu::PeriodicMessageEnded(PeriodicMessageHandle::new(payload[0]))
            }
            PduType::UpdateStartedSendData => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::UpdateStartedSendData
            }
            PduType::UpdateDataReceived => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::UpdateDataReceived
            }
            PduType::UpdateCompleted => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::UpdateCompleted
            }
            PduType::Resetting => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::Resetting
            }
            PduType::ErrorUnspecified => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::ErrorUnspecified
            }
            PduType::ErrorHardware => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::ErrorHardware
            }
            PduType::ErrorInvalidChannel => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::ErrorInvalidChannel
            }
            PduType::ErrorInvalidPeriodic => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::ErrorInvalidPeriodic
            }
            PduType::ErrorNoResponse => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::ErrorNoResponse
            }
            PduType::ErrorInvalidCommand => {
                expect_exact(pdu_type, &payload, 0)?;
                Pdu::ErrorInvalidCommand
            }
        };
        Ok(pdu)
    }
}

impl TryFrom<Bytes> for Pdu {
    type Error = ProtocolError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        RawPdu::try_from(bytes)?.try_into()
    }
}

impl TryFrom<&[u8]> for Pdu {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        RawPdu::try_from(bytes)?.try_into()
    }
}

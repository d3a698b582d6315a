//! Tests for round-trip conversion integrity across the PDU variant space

mod common;

use common::*;

/// One of every PDU variant with representative field values.
fn all_pdus() -> Vec<Pdu> {
    vec![
        Pdu::Ping(Bytes::from_static(&[0xDE, 0xAD])),
        Pdu::RequestInfo,
        Pdu::ReadVoltage,
        Pdu::OpenChannel(ChannelProtocol::Kwp2000),
        Pdu::CloseChannel(ChannelHandle::new(0x01)),
        Pdu::Send {
            channel: ChannelHandle::new(0x01),
            data: Bytes::from_static(&[0x22, 0xF1, 0x90]),
        },
        Pdu::SetArbitration {
            channel: ChannelHandle::new(0x01),
            arbitration: obd2_arbitration(),
        },
        Pdu::StartPeriodicMessage {
            interval: 50,
            arbitration: obd2_arbitration(),
            data: Bytes::from_static(&[0x3E, 0x00]),
        },
        Pdu::EndPeriodicMessage(PeriodicMessageHandle::new(0x02)),
        Pdu::PrepareForUpdate,
        Pdu::SendUpdateData(Bytes::from_static(&[0x00, 0x01, 0x02, 0x03])),
        Pdu::CommitUpdate,
        Pdu::Reset,
        Pdu::Pong(Bytes::from_static(&[0xDE, 0xAD])),
        Pdu::Info(AdapterInfo {
            vendor: "CANyonero".to_string(),
            model: "CY-1".to_string(),
            hardware: "rev2".to_string(),
            serial: "0001".to_string(),
            firmware: "1.0.0".to_string(),
        }),
        Pdu::Voltage { millivolts: 14253 },
        Pdu::ChannelOpened(ChannelHandle::new(0x01)),
        Pdu::ChannelClosed(ChannelHandle::new(0x01)),
        Pdu::Sent {
            channel: ChannelHandle::new(0x01),
            count: 4095,
        },
        Pdu::ArbitrationSet,
        Pdu::PeriodicMessageStarted(PeriodicMessageHandle::new(0x02)),
        Pdu::PeriodicMessageEnded(PeriodicMessageHandle::new(0x02)),
        Pdu::UpdateStartedSendData,
        Pdu::UpdateDataReceived,
        Pdu::UpdateCompleted,
        Pdu::Resetting,
        Pdu::ErrorUnspecified,
        Pdu::ErrorHardware,
        Pdu::ErrorInvalidChannel,
        Pdu::ErrorInvalidPeriodic,
        Pdu::ErrorNoResponse,
        Pdu::ErrorInvalidCommand,
    ]
}

#[test]
fn test_roundtrip_every_variant() {
    for pdu in all_pdus() {
        let bytes = pdu.to_bytes().expect("Failed to encode");
        let decoded = Pdu::try_from(bytes.clone())
            .unwrap_or_else(|e| panic!("{:?}: failed to decode: {e}", pdu.pdu_type()));
        assert_eq!(decoded, pdu, "round-trip mismatch for {:?}", pdu.pdu_type());

        let reencoded = decoded.to_bytes().expect("Failed to re-encode");
        assert_eq!(
            bytes.as_ref(),
            reencoded.as_ref(),
            "re-encode mismatch for {:?}",
            pdu.pdu_type()
        );
    }
}

#[test]
fn test_framing_invariants() {
    for pdu in all_pdus() {
        let raw = pdu.to_raw().expect("Failed to encode");
        let payload_len = raw.payload().len();
        let bytes = Bytes::from(raw);
        assert_eq!(bytes[0], 0x1A);
        assert_eq!(bytes.len(), 4 + payload_len);
        let declared = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        assert_eq!(declared, payload_len);
    }
}

#[test]
fn test_roundtrip_bytes_to_rawpdu_to_bytes() {
    let original = hex_to_bytes("1a060004013e8000");
    let raw = RawPdu::try_from(original.clone()).expect("Failed to parse PDU");
    assert_eq!(raw.pdu_type(), PduType::Send);
    let roundtrip = Bytes::from(raw);
    assert_eq!(
        original.as_ref(),
        roundtrip.as_ref(),
        "Round-trip should preserve bytes exactly. Original: {:02x?}, Got: {:02x?}",
        original.as_ref(),
        roundtrip.as_ref()
    );
}

#[test]
fn test_payload_size_limits() {
    let max = Pdu::Ping(Bytes::from(vec![0x55; 65535]));
    let bytes = max.to_bytes().expect("65535-byte payload must encode");
    assert_eq!(bytes.len(), 4 + 65535);

    let oversize = Pdu::Ping(Bytes::from(vec![0x55; 65536]));
    match oversize.to_bytes() {
        Err(ProtocolError::PayloadTooLarge { len }) => assert_eq!(len, 65536),
        other => panic!("Expected PayloadTooLarge, got {other:?}"),
    }
}

#[test]
fn test_info_field_with_newline_rejected() {
    let pdu = Pdu::Info(AdapterInfo {
        vendor: "CANyonero\nspoof".to_string(),
        model: "CY-1".to_string(),
        hardware: "rev2".to_string(),
        serial: "0001".to_string(),
        firmware: "1.0.0".to_string(),
    });
    assert!(matches!(
        pdu.to_bytes(),
        Err(ProtocolError::InvalidPayload(_))
    ));
}

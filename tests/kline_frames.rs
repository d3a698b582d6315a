//! Tests for K-Line frame construction and splitting

mod common;

use common::*;

#[test]
fn test_build_iso9141_speed_request_response() {
    let frame = build_iso9141(0x11, &[0x41, 0x0D, 0x00]).expect("Failed to build frame");
    assert_eq!(frame.as_ref(), ISO_SPEED_FRAME);
}

#[test]
fn test_build_iso9141_addressed() {
    let frame = build_iso9141_addressed(0x68, 0x6A, 0xF1, &[0x01, 0x00]).unwrap();
    assert_eq!(frame.as_ref(), &[0x68, 0x6A, 0xF1, 0x01, 0x00, 0xC4]);
}

#[test]
fn test_build_iso9141_data_too_large() {
    assert!(matches!(
        build_iso9141(0x11, &[0x00; 253]),
        Err(ProtocolError::InvalidFrame(_))
    ));
    assert!(build_iso9141(0x11, &[0x00; 252]).is_ok());
}

#[test]
fn test_checksum_is_modulo_256_sum() {
    for data in [&[0x01u8] as &[u8], &[0x41, 0x0D, 0x00], &[0xFF; 40]] {
        let frame = build_iso9141(0x11, data).unwrap();
        let sum = frame[..frame.len() - 1]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        assert_eq!(*frame.last().unwrap(), sum);
    }
}

#[test]
fn test_build_kwp_single_layout() {
    let frame = build_kwp_single(0x10, 0xF1, &[0x62, 0x01, 0x02, 0xAA]).unwrap();
    assert_eq!(frame.as_ref(), &[0x84, 0xF1, 0x10, 0x62, 0x01, 0x02, 0xAA, 0x94]);
    // format byte carries the address-mode flag and the data length
    assert_eq!(frame[0] & 0x80, 0x80);
    assert_eq!(frame.len(), 3 + (frame[0] & 0x3F) as usize + 1);
}

#[test]
fn test_build_kwp_single_length_invariant() {
    for len in [1usize, 2, 16, 62, 63] {
        let frame = build_kwp_single(0x10, 0xF1, &vec![0x00; len]).unwrap();
        assert_eq!(frame.len(), 3 + len + 1);
        assert_eq!(frame[0], 0x80 | len as u8);
    }
}

#[test]
fn test_build_kwp_single_rejects_bad_lengths() {
    assert!(matches!(
        build_kwp_single(0x10, 0xF1, &[]),
        Err(ProtocolError::InvalidFrame(_))
    ));
    assert!(matches!(
        build_kwp_single(0x10, 0xF1, &[0x00; 64]),
        Err(ProtocolError::InvalidFrame(_))
    ));
}

#[test]
fn test_build_kwp_multi_canonical_vin_split() {
    let frames = build_kwp_multi(0x10, 0xF1, VIN_PAYLOAD, 0x49, 4).expect("Failed to split");
    assert_eq!(frames.len(), 5);
    for (index, frame) in frames.iter().enumerate() {
        assert_eq!(frame.len(), 11);
        assert_eq!(frame[0], 0x87);
        assert_eq!(frame[1], 0xF1);
        assert_eq!(frame[2], 0x10);
        // every frame re-emits service and PID, then the sequence index
        assert_eq!(&frame[3..6], &[0x49, 0x02, index as u8 + 1]);
        let chunk = &VIN_PAYLOAD[2 + index * 4..2 + index * 4 + 4];
        assert_eq!(&frame[6..10], chunk);
    }
}

#[test]
fn test_build_kwp_multi_short_final_frame() {
    let payload: Vec<u8> = {
        let mut p = vec![0x49, 0x02];
        p.extend_from_slice(&[0x30; 10]);
        p
    };
    let frames = build_kwp_multi(0x10, 0xF1, &payload, 0x49, 4).unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0][0], 0x87);
    assert_eq!(frames[1][0], 0x87);
    // final frame carries the 2 remaining bytes: prefix 3 + 2 data
    assert_eq!(frames[2][0], 0x85);
    assert_eq!(frames[2].len(), 3 + 5 + 1);
}

#[test]
fn test_build_kwp_multi_rejects_bad_parameters() {
    assert!(matches!(
        build_kwp_multi(0x10, 0xF1, &[0x49, 0x02], 0x49, 4),
        Err(ProtocolError::InvalidFrame(_))
    ));
    assert!(matches!(
        build_kwp_multi(0x10, 0xF1, VIN_PAYLOAD, 0x49, 0),
        Err(ProtocolError::InvalidFrame(_))
    ));
    // 3 prefix bytes + 61 data bytes would overflow the 63-byte data field
    assert!(matches!(
        build_kwp_multi(0x10, 0xF1, VIN_PAYLOAD, 0x49, 61),
        Err(ProtocolError::InvalidFrame(_))
    ));
    assert!(build_kwp_multi(0x10, 0xF1, VIN_PAYLOAD, 0x49, 60).is_ok());
}

#[test]
fn test_split_iso9141_returns_whole_buffer() {
    let frames = split_frames(ISO_SPEED_FRAME, KLineMode::Iso9141);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_ref(), ISO_SPEED_FRAME);
}

#[test]
fn test_split_empty_buffer() {
    assert!(split_frames(&[], KLineMode::Kwp).is_empty());
    assert!(split_frames(&[], KLineMode::Iso9141).is_empty());
}

#[test]
fn test_split_kwp_concatenated_frames() {
    let first = build_kwp_single(0x10, 0xF1, &[0x50, 0x81]).unwrap();
    let second = build_kwp_single(0x10, 0xF1, &[0x7E, 0x01, 0x02]).unwrap();
    let mut buffer = first.to_vec();
    buffer.extend_from_slice(&second);

    let frames = split_frames(&buffer, KLineMode::Kwp);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].as_ref(), first.as_ref());
    assert_eq!(frames[1].as_ref(), second.as_ref());
}

#[test]
fn test_split_kwp_length_field_rules() {
    // 20 data bytes: the six-bit rule reads the true length, the
    // low-nibble rule sees 4 and mis-splits
    let frame = build_kwp_single(0x10, 0xF1, &[0x00; 20]).unwrap();
    assert_eq!(frame[0], 0x94);

    let six_bit = split_frames_with(&frame, KLineMode::Kwp, KwpLengthField::LowSixBits);
    assert_eq!(six_bit.len(), 1);
    assert_eq!(six_bit[0].as_ref(), frame.as_ref());

    let nibble = split_frames_with(&frame, KLineMode::Kwp, KwpLengthField::LowNibble);
    assert_eq!(nibble[0].len(), 3 + 4 + 1);
    assert!(nibble.len() > 1);

    // the default follows the adapter firmware
    assert_eq!(split_frames(&frame, KLineMode::Kwp), nibble);
}

#[test]
fn test_split_kwp_truncated_tail() {
    let frame = build_kwp_single(0x10, 0xF1, &[0x01, 0x02, 0x03]).unwrap();
    let truncated = &frame[..frame.len() - 2];
    let frames = split_frames(truncated, KLineMode::Kwp);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_ref(), truncated);
}

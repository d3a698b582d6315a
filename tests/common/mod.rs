//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use canyonero::arbitration::Arbitration;
#[allow(unused_imports)]
pub use canyonero::channel::{ChannelHandle, ChannelProtocol, PeriodicMessageHandle};
#[allow(unused_imports)]
pub use canyonero::error::ProtocolError;
#[allow(unused_imports)]
pub use canyonero::kline::{
    KLineMode, KwpLengthField, build_iso9141, build_iso9141_addressed, build_kwp_multi,
    build_kwp_single, checksum, split_frames, split_frames_with,
};
#[allow(unused_imports)]
pub use canyonero::message::{AdapterInfo, Pdu};
#[allow(unused_imports)]
pub use canyonero::pdu::{PduType, RawPdu};
#[allow(unused_imports)]
pub use canyonero::stream::PduAssembler;
#[allow(unused_imports)]
pub use canyonero::transceiver::{Action, Transceiver, ViolationReason};
#[allow(unused_imports)]
pub use hex;

/// Install a fmt subscriber honoring RUST_LOG. Safe to call from every
/// test; only the first call per binary wins.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// A mode 09 PID 02 (VIN) response payload: service, PID, three padding
/// zeros, then the 17-character VIN
#[allow(dead_code)]
pub const VIN_PAYLOAD: &[u8] = &[
    0x49, 0x02, 0x00, 0x00, 0x00, 0x57, 0x44, 0x58, 0x2D, 0x53, 0x49, 0x4D, 0x30, 0x30, 0x31,
    0x39, 0x32, 0x31, 0x32, 0x33, 0x34, 0x35,
];

/// A complete ISO 9141-2 response frame for mode 01 PID 0D (vehicle speed)
#[allow(dead_code)]
pub const ISO_SPEED_FRAME: &[u8] = &[0x48, 0x6B, 0x11, 0x41, 0x0D, 0x00, 0x12];

/// An arbitration record for a standard 11-bit OBD-II exchange
#[allow(dead_code)]
pub fn obd2_arbitration() -> Arbitration {
    Arbitration::new(0x7E0, 0x7E8, 0x7FF)
}

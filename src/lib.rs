pub mod arbitration;
pub mod channel;
pub mod constants;
pub mod error;
pub mod kline;
pub mod message;
pub mod pdu;
pub mod stream;
pub mod transceiver;

// Re-export commonly used types
pub use arbitration::Arbitration;
pub use channel::{ChannelHandle, ChannelProtocol, PeriodicMessageHandle};
pub use error::ProtocolError;
pub use kline::{KLineMode, KwpLengthField};
pub use message::{AdapterInfo, Pdu};
pub use pdu::{PduType, RawPdu};
pub use stream::PduAssembler;
pub use transceiver::{Action, Transceiver, ViolationReason};

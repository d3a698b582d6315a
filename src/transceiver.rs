//! K-Line response reassembly
//!
//! A [`Transceiver`] owns one request/response exchange on the K-Line. The
//! caller feeds it validated-length frames (see [`crate::kline::split_frames`])
//! one at a time; the transceiver checks headers and checksums, strips the
//! per-frame envelope, and merges the data portions into one logical
//! payload. An exchange concludes either when a configured expected length
//! is reached or when the caller decides, by timeout, that no more frames
//! are coming and calls [`finalize`].
//!
//! [`finalize`]: Transceiver::finalize

use crate::constants::{KLINE_HEADER_SIZE, KWP_FORMAT_FLAG, KWP_LENGTH_MASK, MIN_KLINE_FRAME};
use crate::kline::{KLineMode, checksum};
use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tracing::{debug, trace};

/// Why a K-Line stream became unrecoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViolationReason {
    #[error("Frame of {len} bytes is shorter than the minimal K-Line frame")]
    FrameTooShort { len: usize },

    #[error("Format byte {format:#04x} does not describe a {frame_len}-byte frame")]
    FormatInvalid { format: u8, frame_len: usize },

    #[error("Target address mismatch: expected {expected:#04x}, found {found:#04x}")]
    TargetMismatch { expected: u8, found: u8 },

    #[error("Source address mismatch: expected {expected:#04x}, found {found:#04x}")]
    SourceMismatch { expected: u8, found: u8 },

    #[error("Checksum mismatch: computed {computed:#04x}, frame carries {found:#04x}")]
    ChecksumMismatch { computed: u8, found: u8 },

    #[error("Exchange concluded without data")]
    NoData,
}

/// Outcome of feeding a frame to (or finalizing) a [`Transceiver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Valid partial input consumed; keep feeding.
    WaitForMore,
    /// The complete logical payload.
    Process(Bytes),
    /// The stream is unrecoverable; discard the exchange.
    ProtocolViolation(ViolationReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Accumulating,
    Done(Action),
}

/// Reassembles one logical K-Line response from bus-level frames.
#[derive(Debug)]
pub struct Transceiver {
    target: u8,
    source: u8,
    expected_length: usize,
    mode: KLineMode,
    frames: Vec<Bytes>,
    state: State,
}

impl Transceiver {
    /// A KWP 2000 transceiver expecting frames addressed `target`,
    /// `source`, with unknown response length (concluded by [`finalize`]).
    ///
    /// [`finalize`]: Transceiver::finalize
    pub fn new(target: u8, source: u8) -> Self {
        Self {
            target,
            source,
            expected_length: 0,
            mode: KLineMode::Kwp,
            frames: Vec::new(),
            state: State::Idle,
        }
    }

    /// Conclude automatically once this many logical payload bytes have
    /// been merged. 0 means unknown, await `finalize`.
    pub fn with_expected_length(mut self, expected_length: usize) -> Self {
        self.expected_length = expected_length;
        self
    }

    pub fn with_mode(mut self, mode: KLineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> KLineMode {
        self.mode
    }

    pub fn expected_length(&self) -> usize {
        self.expected_length
    }

    /// Consume one bus-level frame.
    ///
    /// A concluded transceiver keeps returning its terminal action.
    pub fn feed(&mut self, frame: &[u8]) -> Action {
        if let State::Done(action) = &self.state {
            return action.clone();
        }
        trace!("frame [{} bytes]: {:02x?}", frame.len(), frame);
        if let Err(reason) = self.validate(frame) {
            return self.conclude(Action::ProtocolViolation(reason));
        }
        let data = Bytes::copy_from_slice(&frame[KLINE_HEADER_SIZE..frame.len() - 1]);
        self.frames.push(data);
        self.state = State::Accumulating;
        if self.expected_length > 0 {
            let merged = self.merged();
            if merged.len() >= self.expected_length {
                let payload = merged.slice(..self.expected_length);
                return self.conclude(Action::Process(payload));
            }
        }
        Action::WaitForMore
    }

    /// Conclude the exchange with whatever has been merged so far. Called
    /// by the upper layer when its response timeout fires.
    pub fn finalize(&mut self) -> Action {
        if let State::Done(action) = &self.state {
            return action.clone();
        }
        if self.frames.is_empty() {
            return self.conclude(Action::ProtocolViolation(ViolationReason::NoData));
        }
        let merged = self.merged();
        self.conclude(Action::Process(merged))
    }

    fn conclude(&mut self, action: Action) -> Action {
        match &action {
            Action::Process(payload) => debug!("exchange complete, {} payload bytes", payload.len()),
            Action::ProtocolViolation(reason) => debug!("protocol violation: {reason}"),
            Action::WaitForMore => {}
        }
        self.state = State::Done(action.clone());
        action
    }

    fn validate(&self, frame: &[u8]) -> Result<(), ViolationReason> {
        if frame.len() < MIN_KLINE_FRAME {
            return Err(ViolationReason::FrameTooShort { len: frame.len() });
        }
        match self.mode {
            KLineMode::Kwp => {
                let format = frame[0];
                let declared = KLINE_HEADER_SIZE + (format & KWP_LENGTH_MASK) as usize + 1;
                if format & KWP_FORMAT_FLAG == 0 || frame.len() != declared {
                    return Err(ViolationReason::FormatInvalid {
                        format,
                        frame_len: frame.len(),
                    });
                }
                if frame[1] != self.target {
                    return Err(ViolationReason::TargetMismatch {
                        expected: self.target,
                        found: frame[1],
                    });
                }
                if frame[2] != self.source {
                    return Err(ViolationReason::SourceMismatch {
                        expected: self.source,
                        found: frame[2],
                    });
                }
            }
            KLineMode::Iso9141 => {
                if frame[0] != self.target {
                    return Err(ViolationReason::TargetMismatch {
                        expected: self.target,
                        found: frame[0],
                    });
                }
                if frame[1] != self.source {
                    return Err(ViolationReason::SourceMismatch {
                        expected: self.source,
                        found: frame[1],
                    });
                }
            }
        }
        let computed = checksum(&frame[..frame.len() - 1]);
        let found = frame[frame.len() - 1];
        if computed != found {
            return Err(ViolationReason::ChecksumMismatch { computed, found });
        }
        Ok(())
    }

    /// Merge the recorded data portions into the logical payload.
    ///
    /// A counted transfer re-emits the response's service/identifier pair
    /// on every frame, followed by a 1-based sequence index. When all
    /// frames follow that shape, the pair is kept once and every sequence
    /// index is dropped. Otherwise the response simply continues across
    /// frames, and later frames that repeat the pair are stripped of just
    /// those two bytes.
    fn merged(&self) -> Bytes {
        if self.frames.len() <= 1 {
            return self.frames.first().cloned().unwrap_or_default();
        }
        let first = &self.frames[0];
        if first.len() < 2 {
            let mut out = BytesMut::new();
            for frame in &self.frames {
                out.extend_from_slice(frame);
            }
            return out.freeze();
        }
        let pair = [first[0], first[1]];
        let sequenced = self.frames.iter().enumerate().all(|(index, frame)| {
            frame.len() >= 3 && frame[..2] == pair && frame[2] == (index as u8).wrapping_add(1)
        });
        let mut out = BytesMut::new();
        if sequenced {
            out.extend_from_slice(&pair);
            for frame in &self.frames {
                out.extend_from_slice(&frame[3..]);
            }
        } else {
            out.extend_from_slice(first);
            for frame in &self.frames[1..] {
                if frame.len() >= 2 && frame[..2] == pair {
                    out.extend_from_slice(&frame[2..]);
                } else {
                    out.extend_from_slice(frame);
                }
            }
        }
        out.freeze()
    }
}

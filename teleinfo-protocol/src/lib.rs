//! Frame synchronization and decoding for the Teleinfo serial telemetry
//! protocol emitted by electricity meters.
//!
//! This crate recovers discrete frames from a continuous, error-prone byte
//! stream and parses each frame's fields under the two incompatible wire
//! encodings, each with its own per-field checksum algorithm.
//!
//! # Frame format
//!
//! ```text
//! +------+--------------------------------------+------+
//! | STX  |  field lines (mode-specific layout)  | ETX  |
//! | 0x02 |  NAME sep [HORODATE sep] VALUE sep C | 0x03 |
//! +------+--------------------------------------+------+
//! ```
//!
//! Historic mode joins fields with CRLF and separates tokens with spaces;
//! standard mode delimits fields with CR and separates tokens with tabs,
//! with an optional per-field timestamp. The trailing byte `C` is a one-byte
//! checksum mapped into printable ASCII by `(sum & 0x3F) + 0x20`.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use teleinfo_protocol::{FrameReader, Mode};
//!
//! let stream = b"\x02\rPAPP 012345  \r\nPTEC HP..  \n\x03";
//! let mut reader = FrameReader::new(Cursor::new(stream.to_vec()), Mode::Historic);
//!
//! let frame = reader.read_frame().unwrap();
//! assert_eq!(frame.get_string_field("PAPP"), Some("012345"));
//! assert_eq!(frame.get_uint_field("PAPP"), Some(12345));
//! assert_eq!(frame.mode(), Mode::Historic);
//! ```
//!
//! Decoding is atomic: a frame with any failing field is never constructed,
//! and the error names the failure kind (see [`FrameError`]). The canonical
//! caller loop logs recoverable errors and keeps reading; the stream cursor
//! is left in place, so the next call resynchronizes on the following frame.

pub mod codec;
pub mod error;
pub mod framer;
pub mod metrics;
pub mod reader;
pub mod types;

pub use codec::{
    decode_frame, encode_historic, encode_standard, historic_checksum, standard_checksum,
};
pub use error::FrameError;
pub use framer::Framer;
pub use metrics::{FrameMetrics, NoopMetrics};
pub use reader::FrameReader;
pub use types::{Frame, Mode, CHECKSUM_SIZE, FRAME_END, FRAME_START, MAX_FRAME_SIZE};

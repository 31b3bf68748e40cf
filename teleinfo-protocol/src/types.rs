//! Wire constants, protocol mode and the decoded [`Frame`] type.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Start-of-frame marker (STX).
pub const FRAME_START: u8 = 0x02;

/// End-of-frame marker (ETX).
pub const FRAME_END: u8 = 0x03;

/// Maximum frame payload size (64 KiB).
///
/// Bounds the framer's lookahead so a desynchronized stream that never
/// produces an end marker cannot grow the buffer without limit. Real frames
/// are a few hundred bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Per-field checksum size in bytes.
pub const CHECKSUM_SIZE: usize = 1;

/// Wire encoding emitted by the meter.
///
/// The two encodings are incompatible: token separators, field separators
/// and checksum algorithms all differ. A reader decodes exactly one mode for
/// its lifetime; there is no sniffing of the wire content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Legacy encoding: space-separated tokens, CRLF-delimited fields.
    Historic,
    /// Newer encoding: tab-separated tokens, CR-delimited fields, optional
    /// per-field timestamps.
    Standard,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Historic => "historic",
            Mode::Standard => "standard",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "historic" => Ok(Mode::Historic),
            "standard" => Ok(Mode::Standard),
            other => Err(format!(
                "unknown mode '{}' (expected 'historic' or 'standard')",
                other
            )),
        }
    }
}

/// A single decoded Teleinfo frame.
///
/// Immutable once built: every field present passed its per-field checksum,
/// and a frame with any failing field is never constructed. If a field name
/// repeats inside one raw frame, the last occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    mode: Mode,
    #[serde(flatten)]
    fields: HashMap<String, String>,
}

impl Frame {
    pub fn new(mode: Mode, fields: HashMap<String, String>) -> Self {
        Self { mode, fields }
    }

    /// The wire encoding this frame was decoded from.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The frame type: the tariff option (`OPTARIF`) for historic frames,
    /// empty for standard frames (which carry no such field).
    pub fn frame_type(&self) -> &str {
        self.fields.get("OPTARIF").map(String::as_str).unwrap_or("")
    }

    /// The value of a field as a string.
    pub fn get_string_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The value of a field as an unsigned integer.
    ///
    /// Returns `None` on a missing field, non-numeric content (including
    /// negative numbers) or overflow beyond 32 bits.
    pub fn get_uint_field(&self, name: &str) -> Option<u32> {
        self.fields.get(name)?.parse::<u32>().ok()
    }

    /// The full field set.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        let fields: HashMap<String, String> = [
            ("PAPP", "00340"),
            ("HHPHC", "D"),
            ("ADCO", "031028217014"),
            ("OPTARIF", "HC.."),
            ("PTEC", "HP.."),
            ("IINST", "001"),
            ("MOTDETAT", "000000"),
            ("ISOUSC", "45"),
            ("HCHC", "016771964"),
            ("HCHP", "020267321"),
            ("IMAX", "036"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Frame::new(Mode::Historic, fields)
    }

    #[test]
    fn test_frame_type_and_mode() {
        let f = sample_frame();
        assert_eq!(f.frame_type(), "HC..");
        assert_eq!(f.mode(), Mode::Historic);
        assert_eq!(f.mode().to_string(), "historic");
    }

    #[test]
    fn test_frame_type_standard_is_empty() {
        let f = Frame::new(Mode::Standard, HashMap::new());
        assert_eq!(f.frame_type(), "");
        assert_eq!(f.mode().as_str(), "standard");
    }

    #[test]
    fn test_get_string_field() {
        let f = sample_frame();
        assert_eq!(f.get_string_field("PTEC"), Some("HP.."));
        assert_eq!(f.get_string_field("missing"), None);
    }

    #[test]
    fn test_get_uint_field() {
        let f = sample_frame();
        assert_eq!(f.get_uint_field("IMAX"), Some(36));
        assert_eq!(f.get_uint_field("missing"), None);
        // Non-numeric content is a lookup miss, not a panic.
        assert_eq!(f.get_uint_field("OPTARIF"), None);
    }

    #[test]
    fn test_get_uint_field_overflow() {
        let fields = [("EAST".to_string(), "99999999999".to_string())]
            .into_iter()
            .collect();
        let f = Frame::new(Mode::Standard, fields);
        assert_eq!(f.get_uint_field("EAST"), None);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("historic".parse::<Mode>().unwrap(), Mode::Historic);
        assert_eq!("standard".parse::<Mode>().unwrap(), Mode::Standard);
        assert!("auto".parse::<Mode>().is_err());
    }
}

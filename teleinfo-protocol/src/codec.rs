//! Decoding and encoding of Teleinfo frame payloads.
//!
//! A raw payload is the byte sequence found between the start and end
//! markers. Its shape depends on the wire mode:
//!
//! ```text
//! historic:  <LF> NAME SP VALUE SP CHK <CR> ... (fields joined by CRLF)
//! standard:  <LF> NAME HT [HORODATE HT] VALUE HT CHK <CR> ...
//! ```
//!
//! Each field carries a one-byte checksum over its own tokens, mapped into
//! printable ASCII by `(sum & 0x3F) + 0x20`. A checksum failure on any field
//! rejects the whole frame.

use std::collections::HashMap;

use crate::error::FrameError;
use crate::types::{Frame, Mode, CHECKSUM_SIZE};

/// Wrapping 8-bit sum of a byte slice.
fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Map an accumulated sum to a single printable ASCII byte in [0x20, 0x5F].
fn to_printable(checksum: u8) -> u8 {
    (checksum & 0x3F) + 0x20
}

/// Historic-mode checksum: covers the name and value tokens plus the space
/// separating them (0x20).
pub fn historic_checksum(name: &[u8], value: &[u8]) -> u8 {
    to_printable(sum(name).wrapping_add(0x20).wrapping_add(sum(value)))
}

/// Standard-mode checksum: covers the name, optional horodate and value
/// tokens, each followed by its tab separator (0x09). An empty horodate
/// contributes nothing, separator included.
pub fn standard_checksum(name: &[u8], horodate: &[u8], value: &[u8]) -> u8 {
    let mut acc = sum(name).wrapping_add(0x09);
    if !horodate.is_empty() {
        acc = acc.wrapping_add(sum(horodate)).wrapping_add(0x09);
    }
    acc = acc.wrapping_add(sum(value)).wrapping_add(0x09);
    to_printable(acc)
}

/// Split `data` on a multi-byte separator, keeping empty chunks.
fn split_on<'a>(mut data: &'a [u8], sep: &[u8]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    while let Some(pos) = data.windows(sep.len()).position(|w| w == sep) {
        chunks.push(&data[..pos]);
        data = &data[pos + sep.len()..];
    }
    chunks.push(data);
    chunks
}

fn trim_crlf(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|&b| b != b'\r' && b != b'\n')
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map(|p| p + 1)
        .unwrap_or(start);
    &data[start..end]
}

fn field_format_error(line: &[u8]) -> FrameError {
    FrameError::FieldFormat {
        line: String::from_utf8_lossy(line).into_owned(),
    }
}

fn check_field(
    name: &[u8],
    value: &[u8],
    trail: &[u8],
    expected: u8,
) -> Result<(), FrameError> {
    if trail.len() != CHECKSUM_SIZE {
        return Err(FrameError::ChecksumLength {
            actual: trail.len(),
        });
    }
    let read = trail[0];
    if read != expected {
        return Err(FrameError::ChecksumMismatch {
            field: String::from_utf8_lossy(name).into_owned(),
            value: String::from_utf8_lossy(value).into_owned(),
            read: read as char,
            expected: expected as char,
        });
    }
    Ok(())
}

/// Decode a historic-mode payload: fields joined by CRLF, each split on its
/// first two spaces into name, value and checksum.
fn decode_historic(payload: &[u8]) -> Result<HashMap<String, String>, FrameError> {
    let trimmed = trim_crlf(payload);
    let mut fields = HashMap::new();
    for line in split_on(trimmed, b"\r\n") {
        // First two spaces only: the checksum byte may itself be a space.
        let tokens: Vec<&[u8]> = line.splitn(3, |&b| b == b' ').collect();
        let [name, value, trail] = tokens[..] else {
            return Err(field_format_error(line));
        };
        check_field(name, value, trail, historic_checksum(name, value))?;
        fields.insert(
            String::from_utf8_lossy(name).into_owned(),
            String::from_utf8_lossy(value).into_owned(),
        );
    }
    Ok(fields)
}

/// Decode a standard-mode payload: fields delimited by CR, tokens separated
/// by tabs, with an optional horodate between name and value.
fn decode_standard(payload: &[u8]) -> Result<HashMap<String, String>, FrameError> {
    let mut fields = HashMap::new();
    for line in payload.split(|&b| b == b'\r') {
        let line = line.strip_prefix(b"\n").unwrap_or(line);
        let tokens: Vec<&[u8]> = line.split(|&b| b == b'\t').collect();
        let (name, horodate, value, trail) = match tokens[..] {
            // Blank line between frames, skipped.
            [_] => continue,
            [name, value, trail] => (name, &b""[..], value, trail),
            [name, horodate, value, trail] => (name, horodate, value, trail),
            _ => return Err(field_format_error(line)),
        };
        check_field(name, value, trail, standard_checksum(name, horodate, value))?;
        fields.insert(
            String::from_utf8_lossy(name).into_owned(),
            String::from_utf8_lossy(value).into_owned(),
        );
    }
    Ok(fields)
}

/// Decode a raw frame payload under the given mode.
///
/// Fails atomically: any field-level error rejects the whole frame. When a
/// field name repeats within the payload, the last occurrence wins.
pub fn decode_frame(mode: Mode, payload: &[u8]) -> Result<Frame, FrameError> {
    let fields = match mode {
        Mode::Historic => decode_historic(payload)?,
        Mode::Standard => decode_standard(payload)?,
    };
    Ok(Frame::new(mode, fields))
}

/// Encode fields into a historic-mode payload, computing each checksum.
///
/// The markers are not included; this is the exact inverse of decoding the
/// same payload.
pub fn encode_historic(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.push(b'\r');
    for (i, (name, value)) in fields.iter().enumerate() {
        if i > 0 {
            payload.extend_from_slice(b"\r\n");
        }
        payload.extend_from_slice(name.as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(value.as_bytes());
        payload.push(b' ');
        payload.push(historic_checksum(name.as_bytes(), value.as_bytes()));
    }
    payload.push(b'\n');
    payload
}

/// Encode fields into a standard-mode payload, computing each checksum.
/// `horodate` is `None` for fields carried without a timestamp.
pub fn encode_standard(fields: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (name, horodate, value) in fields {
        payload.push(b'\n');
        payload.extend_from_slice(name.as_bytes());
        payload.push(b'\t');
        if let Some(horodate) = horodate {
            payload.extend_from_slice(horodate.as_bytes());
            payload.push(b'\t');
        }
        payload.extend_from_slice(value.as_bytes());
        payload.push(b'\t');
        payload.push(standard_checksum(
            name.as_bytes(),
            horodate.unwrap_or("").as_bytes(),
            value.as_bytes(),
        ));
        payload.push(b'\r');
    }
    payload
}

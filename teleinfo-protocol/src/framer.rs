//! Frame synchronization over a continuous byte stream.
//!
//! The meter emits frames back to back, each wrapped in STX/ETX markers,
//! with occasional garbage in between (line noise, partial frames after a
//! reconnect). The framer scans forward to the next start marker, then
//! accumulates until the end marker, bounded by [`MAX_FRAME_SIZE`] so a
//! desynchronized stream cannot grow the buffer without limit.

use std::io::{self, Read};

use bytes::{Buf, BytesMut};

use crate::error::FrameError;
use crate::types::{FRAME_END, FRAME_START, MAX_FRAME_SIZE};

const READ_CHUNK_SIZE: usize = 4096;

/// Extracts raw frame payloads from an underlying byte source.
///
/// Holds no state across calls beyond the buffered stream cursor; bytes left
/// over after one frame seed the scan for the next.
pub struct Framer<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: Read> Framer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Pull more bytes from the source into the buffer.
    ///
    /// End-of-stream surfaces as an `UnexpectedEof` I/O error so callers can
    /// classify it per scanning phase.
    fn fill(&mut self) -> Result<(), io::Error> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "end of stream",
                    ))
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Discard bytes up to and including the next start marker.
    fn sync_to_frame_start(&mut self) -> Result<(), FrameError> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == FRAME_START) {
                self.buf.advance(pos + 1);
                return Ok(());
            }
            // No marker in the buffered bytes, all garbage.
            self.buf.clear();
            self.fill().map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    FrameError::Sync(e)
                } else {
                    FrameError::Io(e)
                }
            })?;
        }
    }

    /// Read the next raw frame payload, end marker stripped.
    pub fn read_raw_frame(&mut self) -> Result<BytesMut, FrameError> {
        self.sync_to_frame_start()?;

        let mut scanned = 0;
        loop {
            if let Some(pos) = self.buf[scanned..]
                .iter()
                .position(|&b| b == FRAME_END)
                .map(|p| p + scanned)
            {
                let payload = self.buf.split_to(pos);
                self.buf.advance(1);
                if payload.is_empty() {
                    return Err(FrameError::Empty);
                }
                return Ok(payload);
            }
            scanned = self.buf.len();
            if scanned > MAX_FRAME_SIZE {
                // Drop the oversized prefix so the next call rescans from
                // the current cursor.
                self.buf.clear();
                return Err(FrameError::Truncated { scanned });
            }
            self.fill().map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    FrameError::Truncated { scanned }
                } else {
                    FrameError::Io(e)
                }
            })?;
        }
    }

    /// Consume the framer, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn framer_over(bytes: &[u8]) -> Framer<Cursor<Vec<u8>>> {
        Framer::new(Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_read_raw_frame_skips_garbage() {
        let mut stream = b"some junk prefix\r\n".to_vec();
        stream.push(FRAME_START);
        stream.extend_from_slice(b"frame content");
        stream.push(FRAME_END);
        stream.extend_from_slice(b"trailing junk");

        let mut framer = framer_over(&stream);
        let payload = framer.read_raw_frame().unwrap();
        assert_eq!(&payload[..], b"frame content");
    }

    #[test]
    fn test_read_raw_frame_back_to_back() {
        let mut stream = Vec::new();
        for content in [&b"first"[..], b"second"] {
            stream.push(FRAME_START);
            stream.extend_from_slice(content);
            stream.push(FRAME_END);
        }

        let mut framer = framer_over(&stream);
        assert_eq!(&framer.read_raw_frame().unwrap()[..], b"first");
        assert_eq!(&framer.read_raw_frame().unwrap()[..], b"second");
    }

    #[test]
    fn test_no_start_marker_is_sync_error() {
        let mut framer = framer_over(b"qwertyuiop");
        let err = framer.read_raw_frame().unwrap_err();
        assert!(matches!(err, FrameError::Sync(_)));
        assert!(err.is_eof());
        assert_eq!(err.kind(), "no_frame_start_marker");
    }

    #[test]
    fn test_empty_stream_is_sync_error() {
        let mut framer = framer_over(b"");
        let err = framer.read_raw_frame().unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn test_eof_mid_frame_is_truncated() {
        let mut stream = vec![FRAME_START];
        stream.extend_from_slice(b"no end marker here");

        let mut framer = framer_over(&stream);
        let err = framer.read_raw_frame().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { .. }));
        assert_eq!(err.kind(), "no_frame_end_marker");
    }

    #[test]
    fn test_oversized_frame_is_truncated() {
        let mut stream = vec![FRAME_START];
        stream.resize(MAX_FRAME_SIZE + 2, b'x');

        let mut framer = framer_over(&stream);
        let err = framer.read_raw_frame().unwrap_err();
        assert!(matches!(err, FrameError::Truncated { .. }));
    }

    #[test]
    fn test_empty_payload_is_empty_frame_error() {
        let stream = [FRAME_START, FRAME_END, FRAME_START, b'x', FRAME_END];
        let mut framer = framer_over(&stream);

        let err = framer.read_raw_frame().unwrap_err();
        assert!(matches!(err, FrameError::Empty));
        // The failed frame does not corrupt the cursor.
        assert_eq!(&framer.read_raw_frame().unwrap()[..], b"x");
    }
}

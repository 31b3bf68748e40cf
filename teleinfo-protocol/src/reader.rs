//! Blocking frame reader composing the framer and the mode decoder.

use std::io::Read;
use std::sync::Arc;

use crate::codec::decode_frame;
use crate::error::FrameError;
use crate::framer::Framer;
use crate::metrics::{FrameMetrics, NoopMetrics};
use crate::types::{Frame, Mode};

/// Reads decoded Teleinfo frames from a byte source.
///
/// The mode is fixed at construction: one reader instance decodes exactly
/// one wire encoding for its lifetime. Each `read_frame` call is
/// independent; a failure leaves the stream cursor wherever scanning
/// stopped, and the next call resumes from there.
pub struct FrameReader<R> {
    framer: Framer<R>,
    mode: Mode,
    metrics: Arc<dyn FrameMetrics>,
}

impl<R: Read> FrameReader<R> {
    /// Create a reader over `inner`, usually an open serial port.
    pub fn new(inner: R, mode: Mode) -> Self {
        Self::with_metrics(inner, mode, Arc::new(NoopMetrics))
    }

    /// Create a reader that reports read/decode counters into `metrics`.
    pub fn with_metrics(inner: R, mode: Mode, metrics: Arc<dyn FrameMetrics>) -> Self {
        Self {
            framer: Framer::new(inner),
            mode,
            metrics,
        }
    }

    /// The wire encoding this reader decodes.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Read and decode the next frame.
    pub fn read_frame(&mut self) -> Result<Frame, FrameError> {
        let raw = match self.framer.read_raw_frame() {
            Ok(raw) => {
                self.metrics.frame_read();
                raw
            }
            Err(err) => {
                self.metrics.frame_read_error(err.kind());
                return Err(err);
            }
        };
        match decode_frame(self.mode, &raw) {
            Ok(frame) => {
                self.metrics.frame_decoded();
                Ok(frame)
            }
            Err(err) => {
                self.metrics.frame_decode_error(err.kind());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FRAME_END, FRAME_START};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn wrap_frame(payload: &[u8]) -> Vec<u8> {
        let mut raw = vec![FRAME_START];
        raw.extend_from_slice(payload);
        raw.push(FRAME_END);
        raw
    }

    fn reader_over(raw: Vec<u8>, mode: Mode) -> FrameReader<Cursor<Vec<u8>>> {
        FrameReader::new(Cursor::new(raw), mode)
    }

    const HISTORIC_PAYLOAD: &[u8] =
        b"\rPAPP 012345  \r\nPTEC HP..  \r\nHCHC 09876543 @\r\nHCHP 1654800 K\n";

    #[test]
    fn test_read_historic_frame() {
        let mut reader = reader_over(wrap_frame(HISTORIC_PAYLOAD), Mode::Historic);
        let frame = reader.read_frame().unwrap();

        let expected: HashMap<String, String> = [
            ("PAPP", "012345"),
            ("PTEC", "HP.."),
            ("HCHC", "09876543"),
            ("HCHP", "1654800"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(frame, Frame::new(Mode::Historic, expected));
    }

    #[test]
    fn test_read_standard_frame() {
        let payload = b"\nADSC\t12345678900\tJ\r\
                        \nSMAXSN\tH191203032158\t05706\tB\r\
                        \nSMAXSN-1\tH191202171658\t05661\t(\r\
                        \nUMOY1\tH191203125000\t232\t-\r\
                        \nPJOURF+1\t00008002 0256C001 07568002 1156C001 14568002 NONUTILE NONUTILE NONUTILE NONUTILE NONUTILE NONUTILE\t:\r";
        let mut reader = reader_over(wrap_frame(payload), Mode::Standard);
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.mode(), Mode::Standard);
        assert_eq!(frame.get_uint_field("SMAXSN"), Some(5706));
        assert_eq!(frame.get_string_field("SMAXSN-1"), Some("05661"));
        assert_eq!(frame.get_uint_field("UMOY1"), Some(232));
        assert!(frame
            .get_string_field("PJOURF+1")
            .unwrap()
            .starts_with("00008002"));
    }

    #[test]
    fn test_read_frame_eof() {
        let mut reader = reader_over(Vec::new(), Mode::Historic);
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn test_failed_frame_does_not_corrupt_reader_state() {
        let mut raw = wrap_frame(b"\rHCHC 09876543 e\n");
        raw.extend_from_slice(&wrap_frame(HISTORIC_PAYLOAD));
        let mut reader = reader_over(raw, Mode::Historic);

        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ChecksumMismatch { .. }
        ));
        // The next call resumes scanning and finds the good frame.
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.get_string_field("PAPP"), Some("012345"));
    }

    #[derive(Default)]
    struct CountingMetrics {
        read: AtomicU64,
        read_errors: AtomicU64,
        decoded: AtomicU64,
        decode_errors: AtomicU64,
    }

    impl FrameMetrics for CountingMetrics {
        fn frame_read(&self) {
            self.read.fetch_add(1, Ordering::Relaxed);
        }
        fn frame_read_error(&self, _kind: &'static str) {
            self.read_errors.fetch_add(1, Ordering::Relaxed);
        }
        fn frame_decoded(&self) {
            self.decoded.fetch_add(1, Ordering::Relaxed);
        }
        fn frame_decode_error(&self, _kind: &'static str) {
            self.decode_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_metrics_are_reported() {
        let metrics = Arc::new(CountingMetrics::default());
        let mut raw = wrap_frame(b"\rHCHC 09876543 e\n");
        raw.extend_from_slice(&wrap_frame(HISTORIC_PAYLOAD));
        let mut reader =
            FrameReader::with_metrics(Cursor::new(raw), Mode::Historic, metrics.clone());

        let _ = reader.read_frame();
        let _ = reader.read_frame();
        let _ = reader.read_frame(); // EOF

        assert_eq!(metrics.read.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.decoded.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.decode_errors.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.read_errors.load(Ordering::Relaxed), 1);
    }
}

//! Observability hook for frame reading and decoding.
//!
//! Counters are process-wide state owned by the embedding application; the
//! decode engine only reports into an interface handed to it at construction
//! time, never into module globals.

/// Receiver for frame read/decode counter increments.
///
/// Error increments carry the stable tag from
/// [`FrameError::kind`](crate::FrameError::kind).
pub trait FrameMetrics: Send + Sync {
    /// A raw frame was extracted from the stream.
    fn frame_read(&self) {}

    /// Raw frame extraction failed.
    fn frame_read_error(&self, _kind: &'static str) {}

    /// A raw frame was decoded into a [`Frame`](crate::Frame).
    fn frame_decoded(&self) {}

    /// Decoding a raw frame failed.
    fn frame_decode_error(&self, _kind: &'static str) {}
}

/// Discards all increments. The default when no collector is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl FrameMetrics for NoopMetrics {}

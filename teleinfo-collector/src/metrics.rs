//! Process-wide frame counters and their text exposition.
//!
//! One [`CollectorMetrics`] instance is created at startup and shared by the
//! reader thread (through the [`FrameMetrics`] interface) and the HTTP
//! `/metrics` endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use teleinfo_protocol::FrameMetrics;

/// Error kinds with a dedicated counter slot. Must stay in sync with
/// [`teleinfo_protocol::FrameError::kind`].
const ERROR_KINDS: &[&str] = &[
    "no_frame_start_marker",
    "no_frame_end_marker",
    "empty_frame",
    "invalid_field",
    "invalid_checksum_length",
    "checksum_error",
    "io_error",
];

#[derive(Default)]
struct KindCounters {
    counters: [AtomicU64; 7],
    other: AtomicU64,
}

impl KindCounters {
    fn increment(&self, kind: &str) {
        match ERROR_KINDS.iter().position(|&k| k == kind) {
            Some(idx) => self.counters[idx].fetch_add(1, Ordering::Relaxed),
            None => self.other.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn get(&self, kind: &str) -> u64 {
        ERROR_KINDS
            .iter()
            .position(|&k| k == kind)
            .map(|idx| self.counters[idx].load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, out: &mut String, metric: &str) {
        for (idx, kind) in ERROR_KINDS.iter().enumerate() {
            let value = self.counters[idx].load(Ordering::Relaxed);
            out.push_str(&format!(
                "{}{{error_type=\"{}\"}} {}\n",
                metric, kind, value
            ));
        }
    }
}

/// Frame read/decode/export counters for the whole process.
#[derive(Default)]
pub struct CollectorMetrics {
    frames_read: AtomicU64,
    frame_read_errors: KindCounters,
    frames_decoded: AtomicU64,
    frame_decode_errors: KindCounters,
    frames_exported: AtomicU64,
    frame_export_errors: AtomicU64,
}

impl CollectorMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_frame_exported(&self) {
        self.frames_exported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_export_error(&self) {
        self.frame_export_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read.load(Ordering::Relaxed)
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded.load(Ordering::Relaxed)
    }

    pub fn decode_errors_for(&self, kind: &str) -> u64 {
        self.frame_decode_errors.get(kind)
    }

    /// Render all counters in the Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP teleinfo_frames_read_total The total number of read Teleinfo frames\n");
        out.push_str("# TYPE teleinfo_frames_read_total counter\n");
        out.push_str(&format!(
            "teleinfo_frames_read_total {}\n",
            self.frames_read.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP teleinfo_frames_read_errors_total The total number of frame read errors\n");
        out.push_str("# TYPE teleinfo_frames_read_errors_total counter\n");
        self.frame_read_errors
            .render(&mut out, "teleinfo_frames_read_errors_total");

        out.push_str("# HELP teleinfo_frames_decoded_total The total number of decoded frames\n");
        out.push_str("# TYPE teleinfo_frames_decoded_total counter\n");
        out.push_str(&format!(
            "teleinfo_frames_decoded_total {}\n",
            self.frames_decoded.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP teleinfo_frames_decode_errors_total The total number of frame decoding errors\n");
        out.push_str("# TYPE teleinfo_frames_decode_errors_total counter\n");
        self.frame_decode_errors
            .render(&mut out, "teleinfo_frames_decode_errors_total");

        out.push_str("# HELP teleinfo_frames_exported_total The total number of exported frames\n");
        out.push_str("# TYPE teleinfo_frames_exported_total counter\n");
        out.push_str(&format!(
            "teleinfo_frames_exported_total {}\n",
            self.frames_exported.load(Ordering::Relaxed)
        ));

        out.push_str("# HELP teleinfo_frames_export_errors_total The total number of frame export errors\n");
        out.push_str("# TYPE teleinfo_frames_export_errors_total counter\n");
        out.push_str(&format!(
            "teleinfo_frames_export_errors_total {}\n",
            self.frame_export_errors.load(Ordering::Relaxed)
        ));

        out
    }
}

impl FrameMetrics for CollectorMetrics {
    fn frame_read(&self) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
    }

    fn frame_read_error(&self, kind: &'static str) {
        self.frame_read_errors.increment(kind);
    }

    fn frame_decoded(&self) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
    }

    fn frame_decode_error(&self, kind: &'static str) {
        self.frame_decode_errors.increment(kind);
    }
}

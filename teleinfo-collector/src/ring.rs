//! Fixed-capacity buffer of recently decoded frames.

use std::collections::VecDeque;
use std::sync::Mutex;

use teleinfo_protocol::Frame;

/// Keeps the last N frames for serving over HTTP.
///
/// All access goes through one mutex; frames are immutable once published,
/// so a cloned snapshot is safe to hand to any number of readers.
pub struct FrameRing {
    frames: Mutex<VecDeque<Frame>>,
    capacity: usize,
}

impl FrameRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a frame, evicting the oldest when full.
    pub fn push(&self, frame: Frame) {
        let mut frames = self.frames.lock().expect("frame ring lock poisoned");
        if frames.len() == self.capacity {
            frames.pop_front();
        }
        frames.push_back(frame);
    }

    /// Clone the buffered frames, oldest first.
    pub fn snapshot(&self) -> Vec<Frame> {
        let frames = self.frames.lock().expect("frame ring lock poisoned");
        frames.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().expect("frame ring lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use teleinfo_protocol::Mode;

    fn frame_with_papp(value: &str) -> Frame {
        let fields = [("PAPP".to_string(), value.to_string())]
            .into_iter()
            .collect::<HashMap<_, _>>();
        Frame::new(Mode::Historic, fields)
    }

    #[test]
    fn test_push_and_snapshot_order() {
        let ring = FrameRing::new(3);
        for value in ["1", "2", "3"] {
            ring.push(frame_with_papp(value));
        }

        let values: Vec<_> = ring
            .snapshot()
            .iter()
            .map(|f| f.get_string_field("PAPP").unwrap().to_string())
            .collect();
        assert_eq!(values, ["1", "2", "3"]);
    }

    #[test]
    fn test_push_evicts_oldest() {
        let ring = FrameRing::new(2);
        for value in ["1", "2", "3", "4"] {
            ring.push(frame_with_papp(value));
        }

        assert_eq!(ring.len(), 2);
        let values: Vec<_> = ring
            .snapshot()
            .iter()
            .map(|f| f.get_string_field("PAPP").unwrap().to_string())
            .collect();
        assert_eq!(values, ["3", "4"]);
    }

    #[test]
    fn test_empty_ring() {
        let ring = FrameRing::new(4);
        assert!(ring.is_empty());
        assert!(ring.snapshot().is_empty());
    }
}

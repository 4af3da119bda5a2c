//! Single-slot "latest frame" buffer shared between a producer thread and
//! the render thread.
//!
//! The producer overwrites the slot; the consumer reads whatever is newest.
//! Old frames are never queued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use glance_frame_model::FrameBuffer;

#[derive(Debug, Default)]
struct Slot {
    frame: Option<Arc<FrameBuffer>>,
    sequence: u64,
    last_activity: Option<Instant>,
}

/// Cloneable handle to one slot.
#[derive(Debug, Clone, Default)]
pub struct LatestFrame {
    slot: Arc<Mutex<Slot>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the stored frame.
    pub fn publish(&self, frame: FrameBuffer) {
        let mut slot = self.slot();
        slot.frame = Some(Arc::new(frame));
        slot.sequence += 1;
        slot.last_activity = Some(Instant::now());
    }

    /// Record that the producer is alive without a new frame.
    pub fn touch(&self) {
        self.slot().last_activity = Some(Instant::now());
    }

    /// Newest frame, if any has been published.
    pub fn latest(&self) -> Option<Arc<FrameBuffer>> {
        self.slot().frame.clone()
    }

    /// Whether `frame` has the same pixels as the stored frame.
    pub fn matches(&self, frame: &FrameBuffer) -> bool {
        self.slot().frame.as_deref() == Some(frame)
    }

    /// Number of frames published so far.
    pub fn sequence(&self) -> u64 {
        self.slot().sequence
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.slot().last_activity
    }

    pub fn clear(&self) {
        let mut slot = self.slot();
        slot.frame = None;
        slot.last_activity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_frame_model::PixelLayout;

    fn frame(value: u8) -> FrameBuffer {
        FrameBuffer::solid(2, 2, PixelLayout::Bgra, [value, value, value, 255]).unwrap()
    }

    #[test]
    fn test_latest_wins() {
        let slot = LatestFrame::new();
        assert!(slot.latest().is_none());

        slot.publish(frame(1));
        slot.publish(frame(2));
        assert_eq!(slot.sequence(), 2);
        assert_eq!(slot.latest().unwrap().rgba_at(0, 0), [2, 2, 2, 255]);
        assert!(slot.matches(&frame(2)));
        assert!(!slot.matches(&frame(1)));
    }

    #[test]
    fn test_shared_between_threads() {
        let slot = LatestFrame::new();
        let producer = slot.clone();
        std::thread::spawn(move || producer.publish(frame(9)))
            .join()
            .unwrap();
        assert!(slot.latest().is_some());
        assert!(slot.last_activity().is_some());
    }

    #[test]
    fn test_touch_and_clear() {
        let slot = LatestFrame::new();
        slot.touch();
        assert!(slot.last_activity().is_some());
        assert!(slot.latest().is_none());

        slot.publish(frame(3));
        slot.clear();
        assert!(slot.latest().is_none());
        assert!(slot.last_activity().is_none());
    }
}

//! Fixed-capacity ring of recent [`GestureFrame`]s.

use std::collections::VecDeque;

use hand_pose::GestureFrame;

/// Default number of frames kept.
pub const HISTORY_CAPACITY: usize = 8;

/// Append-only, oldest-evicted-first window of processed frames.
///
/// Detectors only ever read it; the classifier is the single writer.
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    frames:   VecDeque<GestureFrame>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self { HistoryBuffer::new(HISTORY_CAPACITY) }
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        HistoryBuffer { frames: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append `frame`, evicting the oldest entry when full.
    pub fn push(&mut self, frame: GestureFrame) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn len(&self)      -> usize { self.frames.len() }
    pub fn is_empty(&self) -> bool  { self.frames.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    pub fn latest(&self) -> Option<&GestureFrame> { self.frames.back() }

    /// The frame before the latest.
    pub fn previous(&self) -> Option<&GestureFrame> {
        self.frames.len().checked_sub(2).and_then(|i| self.frames.get(i))
    }

    /// The most recent `n` frames, oldest first (fewer if not yet filled).
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &GestureFrame> {
        let skip = self.frames.len().saturating_sub(n);
        self.frames.iter().skip(skip)
    }

    /// Extended-finger count of the first hand in each of the last `n`
    /// frames, oldest first. Frames without a hand are skipped.
    pub fn first_hand_counts(&self, n: usize) -> Vec<usize> {
        self.recent(n)
            .filter_map(|f| f.first_hand().map(|h| h.extended_count()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureFrame> { self.frames.iter() }

    pub fn clear(&mut self) { self.frames.clear(); }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

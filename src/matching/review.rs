//! Thread-safe queue of matches awaiting human review.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::matcher::MatchResult;

/// FIFO review queue: matcher workers append, one reviewer pops.
///
/// Clones share the same underlying queue.
#[derive(Clone, Default)]
pub struct HumanReviewQueue {
    pending: Arc<Mutex<VecDeque<MatchResult>>>,
}

impl HumanReviewQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match result for review.
    pub fn enqueue(&self, match_result: MatchResult) {
        self.pending.lock().unwrap().push_back(match_result);
    }

    /// Pop the next item requiring review, oldest first.
    pub fn dequeue(&self) -> Option<MatchResult> {
        self.pending.lock().unwrap().pop_front()
    }

    /// Number of items waiting for review.
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().unwrap().is_empty()
    }
}

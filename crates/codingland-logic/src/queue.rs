//! FIFO work queue used by the pathfinder and the engine's search queue.

use std::collections::VecDeque;

/// First-in, first-out queue.
#[derive(Debug, Clone)]
pub struct StageQueue<T> {
    elements: VecDeque<T>,
}

impl<T> StageQueue<T> {
    pub fn new() -> Self {
        Self {
            elements: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: VecDeque::with_capacity(capacity),
        }
    }

    /// Append to the tail.
    pub fn push(&mut self, element: T) {
        self.elements.push_back(element);
    }

    /// Remove and return the head, or `None` when empty.
    pub fn shift(&mut self) -> Option<T> {
        self.elements.pop_front()
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Keep only the elements matching `keep`, preserving order.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.elements.retain(keep);
    }

    /// Take every queued element in order, leaving the queue empty.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.elements.drain(..)
    }
}

impl<T> Default for StageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

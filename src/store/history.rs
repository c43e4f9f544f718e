use super::options::Options;
use std::collections::VecDeque;

/// Bounded FIFO log of dispatched actions.
#[derive(Debug, Clone)]
pub(crate) struct ActionHistory<A> {
    entries: VecDeque<A>,
}

impl<A: Clone> ActionHistory<A> {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append `action` if recording is on, then enforce the bound.
    ///
    /// The bound applies even with recording off, so shrinking
    /// `record_size` trims old entries on the next dispatch either way.
    pub(crate) fn record(&mut self, action: &A, options: &Options) {
        if options.record {
            self.entries.push_back(action.clone());
        }
        if options.record_size != 0 {
            while self.entries.len() > options.record_size {
                self.entries.pop_front();
            }
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<A> {
        self.entries.iter().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

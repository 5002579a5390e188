//! Time-ordered queue of operator lines for the simulation clock

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Command line due at `at_us`. `seq` keeps lines with equal timestamps in
/// the order they were scheduled.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScheduledCommand {
    pub at_us: u64,
    pub seq: usize,
    pub line: String,
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    queue: BinaryHeap<Reverse<ScheduledCommand>>,
    next_seq: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at_us: u64, line: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(ScheduledCommand {
            at_us,
            seq,
            line: line.into(),
        }));
    }

    /// Removes and returns every command due at or before `now_us`, earliest first.
    pub fn pop_due(&mut self, now_us: u64) -> Vec<ScheduledCommand> {
        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|Reverse(next)| next.at_us <= now_us) {
            if let Some(Reverse(command)) = self.queue.pop() {
                due.push(command);
            }
        }
        due
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

//! Return Address Stack (RAS).
//!
//! Calls push their own instruction pointer; returns pop it and add the
//! estimated call instruction size to predict the return target. When the
//! stack is full the oldest call is dropped, keeping the most recent history.

use std::collections::VecDeque;

/// Return Address Stack structure.
#[derive(Clone, Debug)]
pub struct Ras {
    /// Call instruction pointers, oldest at the front.
    stack: VecDeque<u64>,
    /// Maximum depth.
    capacity: usize,
}

impl Ras {
    /// Creates an empty stack holding at most `capacity` calls.
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a call.
    ///
    /// # Arguments
    ///
    /// * `call_ip` - Instruction pointer of the call.
    pub fn push(&mut self, call_ip: u64) {
        if self.capacity == 0 {
            return;
        }
        if self.stack.len() == self.capacity {
            let _ = self.stack.pop_front();
        }
        self.stack.push_back(call_ip);
    }

    /// Removes and returns the most recent call.
    pub fn pop(&mut self) -> Option<u64> {
        self.stack.pop_back()
    }

    /// Returns the most recent call without removing it.
    pub fn top(&self) -> Option<u64> {
        self.stack.back().copied()
    }

    /// Number of calls on the stack.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if no call is recorded.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

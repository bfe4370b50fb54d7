// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred work posted by the window and drained by the host event loop.
//!
//! ## Minimal example
//!
//! ```
//! use tableau_scene::present::{Task, TaskQueue};
//!
//! let mut queue = TaskQueue::default();
//! queue.post(Task::Present);
//! queue.post(Task::Present);
//! // Posting a present while one is pending coalesces.
//! assert_eq!(queue.len(), 1);
//! assert_eq!(queue.pop(), Some(Task::Present));
//! assert!(queue.is_empty());
//! ```

use alloc::collections::VecDeque;

/// Work the window schedules for the next turn of the host loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    /// Hand the finished frame to the backend.
    Present,
}

/// FIFO of pending [`Task`]s.
///
/// A task equal to one already queued is not queued again.
#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    /// Queues `task` unless an equal task is already pending. Returns `true`
    /// if it was queued.
    pub fn post(&mut self, task: Task) -> bool {
        if self.tasks.contains(&task) {
            return false;
        }
        self.tasks.push_back(task);
        true
    }

    /// Takes the oldest task.
    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// Removes `task` if pending. Returns `true` if it was.
    pub fn take(&mut self, task: Task) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| *t != task);
        self.tasks.len() != before
    }

    /// Returns `true` if `task` is pending.
    pub fn contains(&self, task: Task) -> bool {
        self.tasks.contains(&task)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

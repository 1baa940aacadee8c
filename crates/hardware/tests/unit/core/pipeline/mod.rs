//! Pipeline tests.
//!
//! Each test drives a core cycle by cycle through `TestContext` and inspects
//! its buffers, queues and instruction records.

/// Deadlock detection and the halted core.
pub mod deadlock;

/// Dispatch gating on ROB and load/store queue capacity.
pub mod dispatch;

/// Store-to-load forwarding and store writes.
pub mod forwarding;

//! Pipeline stage implementations.
//!
//! Each stage is a free function over the core and runs once per cycle. The
//! core calls them back to front so that an instruction moves at most one
//! stage per cycle:
//! 1. **Retire:** In-order removal of completed ROB heads.
//! 2. **Execute:** Completion of in-flight executions, then issue of ready instructions.
//! 3. **Schedule:** Registration of register dependency edges.
//! 4. **Memory:** Cache responses, store/load queue operation, memory scheduling at dispatch.
//! 5. **Dispatch:** Dispatch buffer to ROB.
//! 6. **Decode:** Promotion to decode and decode to dispatch, including early misprediction recovery.
//! 7. **Fetch:** Fetch resume, instruction cache requests, DIB lookups, and instruction initialization.

/// Instruction decode and promotion stages.
pub mod decode;

/// ROB dispatch stage.
pub mod dispatch;

/// Execution completion and issue stages.
pub mod execute;

/// Fetch, DIB and initialization stages.
pub mod fetch;

/// Memory return, load/store queue and memory scheduling.
pub mod memory;

/// Retirement stage.
pub mod retire;

/// Dependency scheduling stage.
pub mod schedule;

pub use decode::{decode_stage, promote_stage};
pub use dispatch::dispatch_stage;
pub use execute::{complete_stage, execute_stage};
pub use fetch::{dib_check_stage, fetch_stage, initialize_stage, resume_fetch};
pub use memory::{lsq_stage, memory_return_stage};
pub use retire::retire_stage;
pub use schedule::schedule_stage;

//! Capacity and batching policy
//!
//! These are sized for a part with a few KiB of RAM. Every producer must
//! fit one invocation's output into a single command buffer, so
//! [`PROGRAM_MEMORY_CHUNK`] and the display crate's column batch are
//! chosen against [`COMMAND_BUFFER_CAPACITY`].

/// Commands per buffer slot (two slots are allocated)
pub const COMMAND_BUFFER_CAPACITY: usize = 64;

/// Pending transmission requests, including the active one
pub const TASK_QUEUE_CAPACITY: usize = 4;

/// Bytes streamed per invocation of [`crate::ProgramMemoryStream`]
pub const PROGRAM_MEMORY_CHUNK: usize = 16;

// Start + address + one chunk + stop must fit a single fill.
const _: () = assert!(PROGRAM_MEMORY_CHUNK + 3 <= COMMAND_BUFFER_CAPACITY);

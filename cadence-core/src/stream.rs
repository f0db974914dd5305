//! Streaming a read-only byte region
//!
//! Used for fixed transfers such as controller init sequences that live in
//! flash. The region is sent as a single bus transaction, a bounded chunk
//! per invocation so each batch fits one command buffer.

use crate::config::PROGRAM_MEMORY_CHUNK;
use crate::producer::{CommandSink, Producer, Progress};

/// Producer that sends `data` as one Start/address ... Stop transaction
#[derive(Debug, Clone)]
pub struct ProgramMemoryStream<'a> {
    data: &'a [u8],
    sent: usize,
    chunk: usize,
}

impl<'a> ProgramMemoryStream<'a> {
    /// Stream `data` in [`PROGRAM_MEMORY_CHUNK`]-byte batches
    pub const fn new(data: &'a [u8]) -> Self {
        Self::with_chunk(data, PROGRAM_MEMORY_CHUNK)
    }

    /// Stream `data` in batches of `chunk` bytes
    ///
    /// `chunk` is clamped to at least one byte.
    pub const fn with_chunk(data: &'a [u8], chunk: usize) -> Self {
        Self {
            data,
            sent: 0,
            chunk: if chunk == 0 { 1 } else { chunk },
        }
    }

    /// Bytes already handed to the sink
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Whether every byte has been handed to the sink
    pub fn is_finished(&self) -> bool {
        self.sent == self.data.len()
    }
}

impl Producer for ProgramMemoryStream<'_> {
    fn produce(&mut self, sink: &mut CommandSink<'_>) -> Progress {
        if self.sent == 0 {
            sink.send_start();
        }

        let end = (self.sent + self.chunk).min(self.data.len());
        if end > self.sent {
            sink.send_bytes(&self.data[self.sent..end]);
            self.sent = end;
        }

        if self.is_finished() {
            sink.end_transmission();
            return Progress::Done;
        }
        Progress::More
    }
}

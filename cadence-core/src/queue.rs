//! Task queue
//!
//! Fixed-capacity FIFO of transmission requests. The head task is the
//! active one; its producer is lent out to the fetch cycle while it runs and
//! the task keeps its place (and keeps counting toward `len`) until the
//! producer reports completion.

use heapless::Deque;

use crate::config::TASK_QUEUE_CAPACITY;
use crate::fault::Violation;
use crate::producer::Producer;
use crate::stream::ProgramMemoryStream;

/// Where a task's commands come from
pub enum Source<'a> {
    /// Caller-owned producer, held by the engine until the task completes
    Borrowed(&'a mut (dyn Producer + Send)),
    /// Built-in read-only region streamer, owned by the task
    ProgramMemory(ProgramMemoryStream<'a>),
    /// Producer kept on the stack of a caller blocked in `Engine::transmit`
    ///
    /// Only that caller can run the fetch cycle for this task.
    Scoped,
}

impl<'a> Source<'a> {
    /// The producer behind this source, if the engine holds it
    pub fn producer(&mut self) -> Option<&mut dyn Producer> {
        match self {
            Source::Borrowed(producer) => Some(&mut **producer),
            Source::ProgramMemory(stream) => Some(stream),
            Source::Scoped => None,
        }
    }
}

/// One caller-level transmission request
pub struct Task<'a> {
    address: u8,
    ticket: u32,
    /// `None` while lent to the fetch cycle
    source: Option<Source<'a>>,
}

impl<'a> Task<'a> {
    /// Create a task for the device at `address` (8-bit write address)
    pub fn new(address: u8, source: Source<'a>) -> Self {
        Self {
            address,
            ticket: 0,
            source: Some(source),
        }
    }

    /// Target write address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Identifier handed out when the task was queued
    pub fn ticket(&self) -> u32 {
        self.ticket
    }

    /// Whether the producer is currently lent out
    pub fn is_lent(&self) -> bool {
        self.source.is_none()
    }

    /// Whether the producer lives with a blocked caller
    pub fn is_scoped(&self) -> bool {
        matches!(self.source, Some(Source::Scoped))
    }
}

/// Ring buffer of pending tasks
pub struct TaskQueue<'a> {
    tasks: Deque<Task<'a>, TASK_QUEUE_CAPACITY>,
    next_ticket: u32,
}

impl<'a> Default for TaskQueue<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TaskQueue<'a> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            tasks: Deque::new(),
            next_ticket: 0,
        }
    }

    /// Append at the tail and return the task's ticket
    ///
    /// Returns the task back if the queue is full.
    pub fn enqueue(&mut self, mut task: Task<'a>) -> Result<u32, Task<'a>> {
        let ticket = self.next_ticket;
        task.ticket = ticket;
        self.tasks.push_back(task)?;
        self.next_ticket = ticket.wrapping_add(1);
        Ok(ticket)
    }

    /// Active task
    pub fn peek_head(&self) -> Option<&Task<'a>> {
        self.tasks.front()
    }

    /// Remove the active task
    pub fn pop_head(&mut self) -> Option<Task<'a>> {
        self.tasks.pop_front()
    }

    /// Lend the head task's producer to the fetch cycle
    ///
    /// Returns the target address with the source.
    pub fn checkout_head(&mut self) -> Result<(u8, Source<'a>), Violation> {
        let head = self.tasks.front_mut().ok_or(Violation::QueueEmpty)?;
        let source = head.source.take().ok_or(Violation::HeadAlreadyLent)?;
        Ok((head.address, source))
    }

    /// Give the head task its producer back
    pub fn restore_head(&mut self, source: Source<'a>) -> Result<(), Violation> {
        let head = self.tasks.front_mut().ok_or(Violation::QueueEmpty)?;
        if !head.is_lent() {
            return Err(Violation::HeadNotLent);
        }
        head.source = Some(source);
        Ok(())
    }

    /// Whether the task holding `ticket` is still queued
    pub fn contains(&self, ticket: u32) -> bool {
        self.tasks.iter().any(|task| task.ticket == ticket)
    }

    /// Whether no task is queued
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether another task would be rejected
    pub fn is_full(&self) -> bool {
        self.tasks.is_full()
    }

    /// Number of queued tasks, including a lent head
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Drop every task
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::{CommandSink, Progress};

    struct Nop;

    impl Producer for Nop {
        fn produce(&mut self, sink: &mut CommandSink<'_>) -> Progress {
            sink.end_transmission();
            Progress::Done
        }
    }

    fn stream(data: &'static [u8]) -> Source<'static> {
        Source::ProgramMemory(ProgramMemoryStream::new(data))
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = TaskQueue::new();
        for address in [0x10, 0x20, 0x30] {
            assert!(queue.enqueue(Task::new(address, stream(&[1]))).is_ok());
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek_head().map(Task::address), Some(0x10));
        assert_eq!(queue.pop_head().map(|t| t.address()), Some(0x10));
        assert_eq!(queue.pop_head().map(|t| t.address()), Some(0x20));
        assert_eq!(queue.pop_head().map(|t| t.address()), Some(0x30));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tickets_track_membership() {
        let mut queue = TaskQueue::new();
        let first = queue.enqueue(Task::new(0x10, Source::Scoped)).ok();
        let second = queue.enqueue(Task::new(0x20, stream(&[1]))).ok();
        assert_eq!((first, second), (Some(0), Some(1)));

        let head = queue.peek_head().unwrap();
        assert!(head.is_scoped());
        assert_eq!(head.ticket(), 0);

        queue.pop_head();
        assert!(!queue.contains(0));
        assert!(queue.contains(1));
        assert!(!queue.peek_head().unwrap().is_scoped());
    }

    #[test]
    fn test_scoped_source_has_no_producer() {
        let mut nop = Nop;
        assert!(Source::Scoped.producer().is_none());
        assert!(Source::Borrowed(&mut nop).producer().is_some());
        assert!(stream(&[1]).producer().is_some());
    }

    #[test]
    fn test_enqueue_when_full_returns_task() {
        let mut queue = TaskQueue::new();
        for _ in 0..TASK_QUEUE_CAPACITY {
            assert!(queue.enqueue(Task::new(0x78, stream(&[1]))).is_ok());
        }
        assert!(queue.is_full());

        let rejected = queue.enqueue(Task::new(0x42, stream(&[1])));
        assert_eq!(rejected.err().map(|t| t.address()), Some(0x42));
        assert_eq!(queue.len(), TASK_QUEUE_CAPACITY);
    }

    #[test]
    fn test_checkout_keeps_place() {
        let mut nop = Nop;
        let mut queue = TaskQueue::new();
        assert!(queue.enqueue(Task::new(0x78, Source::Borrowed(&mut nop))).is_ok());

        let (address, source) = queue.checkout_head().unwrap();
        assert_eq!(address, 0x78);
        assert_eq!(queue.len(), 1);
        assert!(queue.peek_head().unwrap().is_lent());
        assert_eq!(
            queue.checkout_head().err(),
            Some(Violation::HeadAlreadyLent)
        );

        queue.restore_head(source).unwrap();
        assert!(!queue.peek_head().unwrap().is_lent());
    }

    #[test]
    fn test_checkout_empty() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.checkout_head().err(), Some(Violation::QueueEmpty));
    }

    #[test]
    fn test_restore_requires_lent_head() {
        let mut queue = TaskQueue::new();
        assert!(queue.enqueue(Task::new(0x78, stream(&[1]))).is_ok());
        assert_eq!(
            queue.restore_head(stream(&[2])),
            Err(Violation::HeadNotLent)
        );
    }
}

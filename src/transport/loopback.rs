//! In-memory loopback hardware.

use std::collections::VecDeque;
use std::io;

use super::Hardware;
use crate::protocol::Packet;

/// Hardware that feeds every written packet back to the read side.
///
/// Packets are delivered in FIFO order. Inbound traffic can also be injected
/// directly with [`Loopback::push`], and writes can be made to fail to
/// exercise error paths.
#[derive(Debug, Default)]
pub struct Loopback {
    queue: VecDeque<Packet>,
    fail_writes: bool,
    initialized: bool,
}

impl Loopback {
    /// Create an empty loopback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a packet for the read side.
    pub fn push(&mut self, packet: Packet) {
        self.queue.push_back(packet);
    }

    /// Take the oldest queued packet without going through [`Hardware::read`].
    pub fn pop(&mut self) -> Option<Packet> {
        self.queue.pop_front()
    }

    /// Take every queued packet, oldest first.
    pub fn drain(&mut self) -> Vec<Packet> {
        self.queue.drain(..).collect()
    }

    /// Number of packets waiting to be read.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Whether `init` has been called without a matching `deinit`.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Hardware for Loopback {
    fn init(&mut self) -> io::Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn deinit(&mut self) -> io::Result<()> {
        self.initialized = false;
        Ok(())
    }

    fn write(&mut self, packet: Packet) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "loopback configured to reject writes",
            ));
        }

        self.queue.push_back(packet);
        Ok(())
    }

    fn read(&mut self) -> Option<Packet> {
        self.queue.pop_front()
    }
}

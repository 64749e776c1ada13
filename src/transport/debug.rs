use std::io;
use std::time::{Duration, Instant};

use tracing::trace;

use super::Hardware;
use crate::protocol::Packet;

/// Which way a recorded packet travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Written to the hardware
    Outbound,
    /// Read from the hardware
    Inbound,
}

/// One captured packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// Time since the recorder was created
    pub elapsed: Duration,
    /// Direction of travel
    pub direction: Direction,
    /// Packet as it crossed the boundary
    pub packet: Packet,
}

/// Hardware wrapper capturing every packet that crosses it.
pub struct Recorder<H> {
    inner: H,
    started: Instant,
    records: Vec<Record>,
}

impl<H: Hardware> Recorder<H> {
    /// Wrap `inner`, starting with an empty capture.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            started: Instant::now(),
            records: Vec::new(),
        }
    }

    /// Captured packets, oldest first.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Take the capture, leaving it empty.
    pub fn take_records(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }

    /// Access the wrapped hardware.
    #[must_use]
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Mutably access the wrapped hardware.
    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    /// Unwrap, discarding the capture.
    pub fn into_inner(self) -> H {
        self.inner
    }

    fn record(&mut self, direction: Direction, packet: Packet) {
        trace!(?direction, %packet, "captured packet");
        self.records.push(Record {
            elapsed: self.started.elapsed(),
            direction,
            packet,
        });
    }
}

impl<H> std::fmt::Debug for Recorder<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl<H: Hardware> Hardware for Recorder<H> {
    fn init(&mut self) -> io::Result<()> {
        self.inner.init()
    }

    fn deinit(&mut self) -> io::Result<()> {
        self.inner.deinit()
    }

    fn write(&mut self, packet: Packet) -> io::Result<()> {
        self.inner.write(packet)?;
        self.record(Direction::Outbound, packet);
        Ok(())
    }

    fn read(&mut self) -> Option<Packet> {
        let packet = self.inner.read()?;
        self.record(Direction::Inbound, packet);
        Some(packet)
    }
}

//! Per-transport packet counters.

/// Packet counters for one transport instance.
///
/// The transport is single-threaded, so plain integers suffice; callers get a
/// copy through [`UsbMidi::metrics`](super::UsbMidi::metrics).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    transmissions: u64,
    packets_sent: u64,
    packets_received: u64,
    packets_dropped: u64,
    write_failures: u64,
}

impl Metrics {
    #[inline]
    pub(crate) fn record_transmission(&mut self) {
        self.transmissions = self.transmissions.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_sent(&mut self) {
        self.packets_sent = self.packets_sent.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_received(&mut self) {
        self.packets_received = self.packets_received.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_dropped(&mut self) {
        self.packets_dropped = self.packets_dropped.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_write_failure(&mut self) {
        self.write_failures = self.write_failures.saturating_add(1);
    }

    /// Number of `begin_transmission` calls.
    #[must_use]
    pub const fn transmissions(&self) -> u64 {
        self.transmissions
    }

    /// Packets accepted by the hardware.
    #[must_use]
    pub const fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Packets read from the hardware and decoded.
    #[must_use]
    pub const fn packets_received(&self) -> u64 {
        self.packets_received
    }

    /// Packets read from the hardware and discarded for a reserved code index.
    #[must_use]
    pub const fn packets_dropped(&self) -> u64 {
        self.packets_dropped
    }

    /// Packets the hardware refused to send.
    #[must_use]
    pub const fn write_failures(&self) -> u64 {
        self.write_failures
    }
}

//! USB-MIDI transport: the packetizing codec and the hardware seam it drives.
//!
//! ```text
//! producer bytes --> [UsbMidi::write]  --> Packet --> Hardware::write
//! Hardware::read --> Packet --> [UsbMidi::read]   --> consumer bytes
//! ```

use std::io;

use crate::protocol::{Message, MessageType, Packet, Result};

#[cfg(feature = "debug-tools")]
mod debug;
mod loopback;
mod metrics;
mod usb;

#[cfg(feature = "debug-tools")]
pub use debug::{Direction, Record, Recorder};
pub use loopback::Loopback;
pub use metrics::Metrics;
pub use usb::{UsbConfig, UsbMidi};

/// Packet-level hardware interface (USB endpoint driver, simulator, ...).
///
/// Implementations must not block: `read` returns `None` when nothing is
/// available and `write` fails immediately if the packet cannot be queued.
pub trait Hardware {
    /// Bring the hardware up. Called once by [`Transport::init`].
    fn init(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Shut the hardware down. Called once by [`Transport::deinit`].
    fn deinit(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Transmit one packet.
    fn write(&mut self, packet: Packet) -> io::Result<()>;

    /// Receive one packet, if one is available.
    fn read(&mut self) -> Option<Packet>;
}

impl<H: Hardware + ?Sized> Hardware for &mut H {
    fn init(&mut self) -> io::Result<()> {
        (**self).init()
    }

    fn deinit(&mut self) -> io::Result<()> {
        (**self).deinit()
    }

    fn write(&mut self, packet: Packet) -> io::Result<()> {
        (**self).write(packet)
    }

    fn read(&mut self) -> Option<Packet> {
        (**self).read()
    }
}

/// Byte-level MIDI transport.
///
/// # Transmit contract
///
/// A message is sent as `begin_transmission`, one `write` per message byte
/// (status first), then exactly one `end_transmission`. Fixed-length
/// messages are flushed by that final call only. Sysex streams may flush
/// full packets from inside `write`, but the `0xF7` terminator never does,
/// so the final `end_transmission` always delivers the last packet.
pub trait Transport {
    /// Reset codec state and initialize the hardware.
    fn init(&mut self) -> Result<()>;

    /// Shut the hardware down.
    fn deinit(&mut self) -> Result<()>;

    /// Start a new outbound message of the given type.
    fn begin_transmission(&mut self, msg_type: MessageType);

    /// Append one byte to the message in progress.
    fn write(&mut self, byte: u8) -> Result<()>;

    /// Hand the packet being assembled to the hardware.
    fn end_transmission(&mut self) -> Result<()>;

    /// Next received byte, fetching a packet from the hardware if needed.
    fn read(&mut self) -> Option<u8>;

    /// Send a complete message following the transmit contract.
    ///
    /// Stops at the first hardware failure.
    fn send(&mut self, message: &Message) -> Result<()> {
        self.begin_transmission(message.message_type());
        for &byte in message.as_bytes() {
            self.write(byte)?;
        }
        self.end_transmission()
    }

    /// Send several messages in order, such as an NRPN sequence.
    ///
    /// Stops at the first failing message.
    fn send_all<'a, I>(&mut self, messages: I) -> Result<()>
    where
        Self: Sized,
        I: IntoIterator<Item = &'a Message>,
    {
        messages.into_iter().try_for_each(|message| self.send(message))
    }
}

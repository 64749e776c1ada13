//! USB-MIDI packet transport
//!
//! Converts a sequential stream of MIDI message bytes into 4-byte USB-MIDI
//! event packets, and received packets back into a byte stream. Fixed-length
//! channel and system messages map onto a single packet; system exclusive
//! streams are split across as many packets as needed and reassembled
//! losslessly.
//!
//! # Quick Start
//!
//! ```rust
//! use usbmidi::{Loopback, Message, Transport, UsbMidi};
//!
//! let mut usb = UsbMidi::new(Loopback::new());
//! usb.init()?;
//!
//! // Packetize a note-on and read it back through the loopback
//! usb.send(&Message::note_on(60, 100, 1)?)?;
//!
//! let bytes: Vec<u8> = std::iter::from_fn(|| usb.read()).collect();
//! assert_eq!(bytes, [0x90, 60, 100]);
//! # Ok::<(), usbmidi::Error>(())
//! ```
//!
//! # Features
//!
//! - **Single in-flight packet** - one packet buffered per direction, no
//!   allocation in the codec
//! - **Exhaustive code index table** - every CIN maps explicitly to a payload
//!   length
//! - **Pluggable hardware** - anything implementing [`Hardware`]
//! - `debug-tools` - `transport::Recorder` packet capture
//! - `serde` - serialization for packets, types and configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod transport;

pub use protocol::{
    Cable, Cin, Error, MMC_ALL_DEVICES, Message, MessageType, MmcCommand, PACKET_SIZE, Packet,
    Result, SYSEX_START, SYSEX_STOP,
};
pub use transport::{Hardware, Loopback, Metrics, Transport, UsbConfig, UsbMidi};

/// USB MIDI class specification revision implemented
pub const USB_MIDI_VERSION: &str = "1.0";

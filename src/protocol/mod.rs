//! USB-MIDI protocol core
//!
//! This module provides the packet wire format, message types and code index
//! numbers, and the outbound message builder.

mod error;
mod message;
mod packet;
mod types;

pub use error::{Error, Result};
pub use message::{MAX_VALUE_14BIT, MMC_ALL_DEVICES, Message, MmcCommand};
pub use packet::Packet;
pub use types::{Cable, Cin, MessageType};

/// Packet size in bytes (header + 3 payload bytes)
pub const PACKET_SIZE: usize = 4;

/// Payload bytes per packet
pub const PACKET_PAYLOAD_SIZE: usize = PACKET_SIZE - 1;

/// System exclusive start marker
pub const SYSEX_START: u8 = 0xF0;

/// System exclusive stop marker
pub const SYSEX_STOP: u8 = 0xF7;

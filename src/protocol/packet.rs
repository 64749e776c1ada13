//! USB-MIDI event packet
//!
//! Every packet is exactly 4 bytes, regardless of how many MIDI bytes it
//! carries.

use std::fmt;

use super::{Cable, Cin, PACKET_SIZE};

/// Offset of the header (cable + code index) byte
const EVENT: usize = 0;

/// Offset of the first payload byte
const DATA: usize = 1;

/// USB-MIDI event packet (4 bytes)
///
/// # Wire Format
///
/// ```text
///  0       4       8              16              24              32
/// +-------+-------+---------------+---------------+---------------+
/// | Cable |  CIN  |     Data 1    |     Data 2    |     Data 3    |
/// +-------+-------+---------------+---------------+---------------+
/// ```
///
/// Unused payload bytes are zero on transmit and ignored on receive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Packet {
    bytes: [u8; PACKET_SIZE],
}

impl Packet {
    /// Create a packet for `cable` with the given code index and payload
    #[must_use]
    pub const fn new(cable: Cable, cin: Cin, data: [u8; 3]) -> Self {
        Self {
            bytes: [header(cable, cin), data[0], data[1], data[2]],
        }
    }

    /// Raw header byte
    #[must_use]
    pub const fn event(&self) -> u8 {
        self.bytes[EVENT]
    }

    /// Cable number (high nibble of the header)
    #[must_use]
    pub const fn cable(&self) -> Cable {
        Cable(self.bytes[EVENT] >> 4)
    }

    /// Code index number (low nibble of the header)
    #[must_use]
    pub const fn cin(&self) -> Cin {
        Cin::from_nibble(self.bytes[EVENT])
    }

    /// First payload byte
    #[must_use]
    pub const fn data1(&self) -> u8 {
        self.bytes[DATA]
    }

    /// Second payload byte
    #[must_use]
    pub const fn data2(&self) -> u8 {
        self.bytes[DATA + 1]
    }

    /// Third payload byte
    #[must_use]
    pub const fn data3(&self) -> u8 {
        self.bytes[DATA + 2]
    }

    /// All three payload bytes, used or not
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.bytes[DATA..]
    }

    /// Payload bytes declared meaningful by the code index
    ///
    /// `None` for reserved code indexes.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        let len = self.cin().payload_len()?;
        Some(&self.bytes[DATA..DATA + len])
    }

    pub(crate) fn set_header(&mut self, cable: Cable, cin: Cin) {
        self.bytes[EVENT] = header(cable, cin);
    }

    /// Store `byte` at payload `position` (0-2); returns `false` past the end.
    pub(crate) fn set_data(&mut self, position: usize, byte: u8) -> bool {
        match self.bytes.get_mut(DATA + position) {
            Some(slot) => {
                *slot = byte;
                true
            }
            None => false,
        }
    }

    /// Convert to wire bytes
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        self.bytes
    }

    /// Parse from wire bytes
    ///
    /// Only the first 4 bytes are read. The code index is not validated here;
    /// the receive path decides what to do with reserved codes.
    pub fn from_bytes(bytes: &[u8]) -> super::Result<Self> {
        let Some(bytes) = bytes.first_chunk::<PACKET_SIZE>() else {
            return Err(super::Error::BufferTooSmall {
                needed: PACKET_SIZE,
                got: bytes.len(),
            });
        };

        Ok(Self { bytes: *bytes })
    }
}

impl From<[u8; PACKET_SIZE]> for Packet {
    fn from(bytes: [u8; PACKET_SIZE]) -> Self {
        Self { bytes }
    }
}

impl From<Packet> for [u8; PACKET_SIZE] {
    fn from(packet: Packet) -> Self {
        packet.bytes
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [event, data1, data2, data3] = self.bytes;
        write!(f, "[{event:02x} {data1:02x} {data2:02x} {data3:02x}]")
    }
}

/// Build a header byte from a cable number and a code index.
const fn header(cable: Cable, cin: Cin) -> u8 {
    (cable.as_u8() << 4) | cin.as_u8()
}

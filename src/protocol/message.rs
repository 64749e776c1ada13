//! Outbound MIDI message builder
//!
//! A [`Message`] holds the exact byte sequence a transport is fed through
//! `write`, status byte first. Sysex messages include their `0xF0`/`0xF7`
//! boundaries.

use super::{Error, MessageType, Result, SYSEX_START, SYSEX_STOP};

/// Mask for 7-bit MIDI data bytes
const DATA_MASK: u8 = 0x7F;

/// Largest 14-bit value (pitch bend, song position)
pub const MAX_VALUE_14BIT: u16 = 0x3FFF;

/// MIDI Machine Control transport commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MmcCommand {
    /// Stop
    Stop = 0x01,
    /// Play
    Play = 0x02,
    /// Record strobe (punch in)
    RecordStart = 0x06,
    /// Record exit (punch out)
    RecordStop = 0x07,
    /// Pause
    Pause = 0x09,
}

impl MmcCommand {
    /// Command byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Device ID addressing every MMC receiver
pub const MMC_ALL_DEVICES: u8 = 0x7F;

/// MIDI message ready for transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    msg_type: MessageType,
    bytes: Vec<u8>,
}

impl Message {
    /// Create a channel voice message
    ///
    /// `channel` is 1-based (1-16). Data bytes are masked to 7 bits; program
    /// change and channel aftertouch ignore `data2`.
    pub fn channel(msg_type: MessageType, channel: u8, data1: u8, data2: u8) -> Result<Self> {
        if !msg_type.is_channel_message() {
            return Err(Error::InvalidMessageType {
                type_byte: msg_type.as_u8(),
            });
        }

        if !(1..=16).contains(&channel) {
            return Err(Error::InvalidChannel { channel });
        }

        let status = msg_type.as_u8() | (channel - 1);
        let mut bytes = vec![status, data1 & DATA_MASK, data2 & DATA_MASK];
        if let Some(len) = msg_type.payload_len() {
            bytes.truncate(len);
        }

        Ok(Self { msg_type, bytes })
    }

    /// Note On
    pub fn note_on(note: u8, velocity: u8, channel: u8) -> Result<Self> {
        Self::channel(MessageType::NoteOn, channel, note, velocity)
    }

    /// Note Off
    pub fn note_off(note: u8, velocity: u8, channel: u8) -> Result<Self> {
        Self::channel(MessageType::NoteOff, channel, note, velocity)
    }

    /// Control Change
    pub fn control_change(control: u8, value: u8, channel: u8) -> Result<Self> {
        Self::channel(MessageType::ControlChange, channel, control, value)
    }

    /// Program Change
    pub fn program_change(program: u8, channel: u8) -> Result<Self> {
        Self::channel(MessageType::ProgramChange, channel, program, 0)
    }

    /// Polyphonic aftertouch for a single note
    pub fn after_touch_poly(note: u8, pressure: u8, channel: u8) -> Result<Self> {
        Self::channel(MessageType::AfterTouchPoly, channel, note, pressure)
    }

    /// Channel (monophonic) aftertouch
    pub fn after_touch_channel(pressure: u8, channel: u8) -> Result<Self> {
        Self::channel(MessageType::AfterTouchChannel, channel, pressure, 0)
    }

    /// Pitch Bend from a 14-bit value (8192 is centre)
    pub fn pitch_bend(value: u16, channel: u8) -> Result<Self> {
        let (lsb, msb) = split_14bit(value);
        Self::channel(MessageType::PitchBend, channel, lsb, msb)
    }

    /// Coarse/fine controller pair for a 14-bit value
    ///
    /// Controller `control` carries the MSB and `control + 32` the LSB.
    pub fn control_change_14bit(control: u8, value: u16, channel: u8) -> Result<[Self; 2]> {
        let control = control & DATA_MASK;
        let (lsb, msb) = split_14bit(value);

        Ok([
            Self::control_change(control, msb, channel)?,
            Self::control_change(control + 32, lsb, channel)?,
        ])
    }

    /// Non-registered parameter number sequence
    ///
    /// Selects `parameter` through CC 99/98, then sets data entry CC 6. With
    /// `value_14bit`, CC 6 carries the MSB and CC 38 the LSB; otherwise CC 6
    /// carries the low 7 bits of `value`.
    pub fn nrpn(parameter: u16, value: u16, channel: u8, value_14bit: bool) -> Result<Vec<Self>> {
        let (param_lsb, param_msb) = split_14bit(parameter);
        let (value_lsb, value_msb) = split_14bit(value);

        let mut messages = vec![
            Self::control_change(99, param_msb, channel)?,
            Self::control_change(98, param_lsb, channel)?,
        ];

        if value_14bit {
            messages.push(Self::control_change(6, value_msb, channel)?);
            messages.push(Self::control_change(38, value_lsb, channel)?);
        } else {
            messages.push(Self::control_change(6, value_lsb, channel)?);
        }

        Ok(messages)
    }

    /// System exclusive message wrapping `payload` in start/stop markers
    #[must_use]
    pub fn sysex(payload: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(payload.len() + 2);
        bytes.push(SYSEX_START);
        bytes.extend_from_slice(payload);
        bytes.push(SYSEX_STOP);

        Self {
            msg_type: MessageType::SysEx,
            bytes,
        }
    }

    /// System exclusive message from bytes that already carry the `0xF0`
    /// and `0xF7` boundaries
    ///
    /// The bytes are sent untouched.
    #[must_use]
    pub fn sysex_raw(bytes: &[u8]) -> Self {
        Self {
            msg_type: MessageType::SysEx,
            bytes: bytes.to_vec(),
        }
    }

    /// MIDI Machine Control command (`F0 7F <device> 06 <command> F7`)
    #[must_use]
    pub fn mmc(device_id: u8, command: MmcCommand) -> Self {
        Self::sysex_raw(&[
            SYSEX_START,
            0x7F,
            device_id & DATA_MASK,
            0x06,
            command.as_u8(),
            SYSEX_STOP,
        ])
    }

    /// MIDI Time Code Quarter Frame from its type and value nibbles
    #[must_use]
    pub fn time_code_quarter_frame(type_nibble: u8, value_nibble: u8) -> Self {
        let data = ((type_nibble & 0x07) << 4) | (value_nibble & 0x0F);
        Self::time_code_quarter_frame_raw(data)
    }

    /// MIDI Time Code Quarter Frame from an already encoded data byte
    #[must_use]
    pub fn time_code_quarter_frame_raw(data: u8) -> Self {
        Self::system(MessageType::TimeCodeQuarterFrame, &[data & DATA_MASK])
    }

    /// Song Position Pointer, in MIDI beats since the start of the song
    #[must_use]
    pub fn song_position(beats: u16) -> Self {
        let (lsb, msb) = split_14bit(beats);
        Self::system(MessageType::SongPosition, &[lsb, msb])
    }

    /// Song Select
    #[must_use]
    pub fn song_select(song: u8) -> Self {
        Self::system(MessageType::SongSelect, &[song & DATA_MASK])
    }

    /// Tune Request
    #[must_use]
    pub fn tune_request() -> Self {
        Self::system(MessageType::TuneRequest, &[])
    }

    /// System real time message
    pub fn real_time(msg_type: MessageType) -> Result<Self> {
        if !msg_type.is_real_time() {
            return Err(Error::InvalidMessageType {
                type_byte: msg_type.as_u8(),
            });
        }

        Ok(Self::system(msg_type, &[]))
    }

    fn system(msg_type: MessageType, data: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(data.len() + 1);
        bytes.push(msg_type.as_u8());
        bytes.extend_from_slice(data);

        Self { msg_type, bytes }
    }

    /// Get message type
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.msg_type
    }

    /// Wire bytes, status first
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of wire bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check whether the message carries no bytes (never true for built messages)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Split a 14-bit value into (LSB, MSB) 7-bit halves.
fn split_14bit(value: u16) -> (u8, u8) {
    let value = value & MAX_VALUE_14BIT;
    let lsb = u8::try_from(value & 0x7F).unwrap_or(DATA_MASK);
    let msb = u8::try_from(value >> 7).unwrap_or(DATA_MASK);
    (lsb, msb)
}

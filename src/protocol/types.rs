//! MIDI message types, USB-MIDI code index numbers and cable numbers

use std::fmt;

/// MIDI message types
///
/// The discriminant is the status byte with the channel nibble cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageType {
    /// Note Off
    NoteOff = 0x80,
    /// Note On
    NoteOn = 0x90,
    /// Polyphonic (per-key) aftertouch
    AfterTouchPoly = 0xA0,
    /// Control Change / Channel Mode
    ControlChange = 0xB0,
    /// Program Change
    ProgramChange = 0xC0,
    /// Channel (monophonic) aftertouch
    AfterTouchChannel = 0xD0,
    /// Pitch Bend
    PitchBend = 0xE0,

    /// System Exclusive
    SysEx = 0xF0,
    /// System Common - MIDI Time Code Quarter Frame
    TimeCodeQuarterFrame = 0xF1,
    /// System Common - Song Position Pointer
    SongPosition = 0xF2,
    /// System Common - Song Select
    SongSelect = 0xF3,
    /// System Common - Tune Request
    TuneRequest = 0xF6,

    /// System Real Time - Timing Clock
    Clock = 0xF8,
    /// System Real Time - Start
    Start = 0xFA,
    /// System Real Time - Continue
    Continue = 0xFB,
    /// System Real Time - Stop
    Stop = 0xFC,
    /// System Real Time - Active Sensing
    ActiveSensing = 0xFE,
    /// System Real Time - System Reset
    SystemReset = 0xFF,
}

impl MessageType {
    /// Every message type, in status byte order
    pub const ALL: [Self; 18] = [
        Self::NoteOff,
        Self::NoteOn,
        Self::AfterTouchPoly,
        Self::ControlChange,
        Self::ProgramChange,
        Self::AfterTouchChannel,
        Self::PitchBend,
        Self::SysEx,
        Self::TimeCodeQuarterFrame,
        Self::SongPosition,
        Self::SongSelect,
        Self::TuneRequest,
        Self::Clock,
        Self::Start,
        Self::Continue,
        Self::Stop,
        Self::ActiveSensing,
        Self::SystemReset,
    ];

    /// Convert from byte
    ///
    /// Channel message types only match with a clear channel nibble; use
    /// [`MessageType::from_status_byte`] for raw status bytes.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x80 => Some(Self::NoteOff),
            0x90 => Some(Self::NoteOn),
            0xA0 => Some(Self::AfterTouchPoly),
            0xB0 => Some(Self::ControlChange),
            0xC0 => Some(Self::ProgramChange),
            0xD0 => Some(Self::AfterTouchChannel),
            0xE0 => Some(Self::PitchBend),
            0xF0 => Some(Self::SysEx),
            0xF1 => Some(Self::TimeCodeQuarterFrame),
            0xF2 => Some(Self::SongPosition),
            0xF3 => Some(Self::SongSelect),
            0xF6 => Some(Self::TuneRequest),
            0xF8 => Some(Self::Clock),
            0xFA => Some(Self::Start),
            0xFB => Some(Self::Continue),
            0xFC => Some(Self::Stop),
            0xFE => Some(Self::ActiveSensing),
            0xFF => Some(Self::SystemReset),
            _ => None,
        }
    }

    /// Extract the message type from a status byte
    ///
    /// Data bytes (< 0x80) and undefined system statuses yield `None`.
    #[must_use]
    pub fn from_status_byte(status: u8) -> Option<Self> {
        match status {
            0x80..=0xEF => Self::from_u8(status & 0xF0),
            _ => Self::from_u8(status),
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Code index number announced for this type
    ///
    /// For [`MessageType::SysEx`] this is the start code; the transmit path
    /// rewrites it once the terminator arrives.
    #[must_use]
    pub const fn cin(self) -> Cin {
        match self {
            Self::NoteOff => Cin::NoteOff,
            Self::NoteOn => Cin::NoteOn,
            Self::AfterTouchPoly => Cin::AfterTouchPoly,
            Self::ControlChange => Cin::ControlChange,
            Self::ProgramChange => Cin::ProgramChange,
            Self::AfterTouchChannel => Cin::AfterTouchChannel,
            Self::PitchBend => Cin::PitchBend,
            Self::SysEx => Cin::SysExStart,
            Self::TimeCodeQuarterFrame | Self::SongSelect => Cin::SystemCommon2Byte,
            Self::SongPosition => Cin::SystemCommon3Byte,
            Self::TuneRequest => Cin::SYSTEM_COMMON_1_BYTE,
            Self::Clock
            | Self::Start
            | Self::Continue
            | Self::Stop
            | Self::ActiveSensing
            | Self::SystemReset => Cin::SingleByte,
        }
    }

    /// Number of bytes (status included) a message of this type occupies
    ///
    /// `None` for sysex, whose length is open-ended.
    #[must_use]
    pub const fn payload_len(self) -> Option<usize> {
        match self {
            Self::SysEx => None,
            _ => self.cin().payload_len(),
        }
    }

    /// Check if this is a channel voice message
    #[must_use]
    pub const fn is_channel_message(self) -> bool {
        matches!(
            self,
            Self::NoteOff
                | Self::NoteOn
                | Self::AfterTouchPoly
                | Self::ControlChange
                | Self::ProgramChange
                | Self::AfterTouchChannel
                | Self::PitchBend
        )
    }

    /// Check if this is a system common message
    #[must_use]
    pub const fn is_system_common(self) -> bool {
        matches!(
            self,
            Self::TimeCodeQuarterFrame | Self::SongPosition | Self::SongSelect | Self::TuneRequest
        )
    }

    /// Check if this is a system real time message
    #[must_use]
    pub const fn is_real_time(self) -> bool {
        matches!(
            self,
            Self::Clock
                | Self::Start
                | Self::Continue
                | Self::Stop
                | Self::ActiveSensing
                | Self::SystemReset
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoteOff => "NoteOff",
            Self::NoteOn => "NoteOn",
            Self::AfterTouchPoly => "AfterTouchPoly",
            Self::ControlChange => "ControlChange",
            Self::ProgramChange => "ProgramChange",
            Self::AfterTouchChannel => "AfterTouchChannel",
            Self::PitchBend => "PitchBend",
            Self::SysEx => "SysEx",
            Self::TimeCodeQuarterFrame => "TimeCodeQuarterFrame",
            Self::SongPosition => "SongPosition",
            Self::SongSelect => "SongSelect",
            Self::TuneRequest => "TuneRequest",
            Self::Clock => "Clock",
            Self::Start => "Start",
            Self::Continue => "Continue",
            Self::Stop => "Stop",
            Self::ActiveSensing => "ActiveSensing",
            Self::SystemReset => "SystemReset",
        };
        write!(f, "{name}")
    }
}

/// USB-MIDI code index number (low nibble of the packet header)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Cin {
    /// Miscellaneous function codes, reserved
    Misc = 0x0,
    /// Cable events, reserved
    CableEvent = 0x1,
    /// Two-byte system common message
    SystemCommon2Byte = 0x2,
    /// Three-byte system common message
    SystemCommon3Byte = 0x3,
    /// Sysex starts or continues
    SysExStart = 0x4,
    /// Sysex ends with one byte; also single-byte system common
    SysExEnd1Byte = 0x5,
    /// Sysex ends with two bytes
    SysExEnd2Byte = 0x6,
    /// Sysex ends with three bytes
    SysExEnd3Byte = 0x7,
    /// Note Off
    NoteOff = 0x8,
    /// Note On
    NoteOn = 0x9,
    /// Polyphonic aftertouch
    AfterTouchPoly = 0xA,
    /// Control Change
    ControlChange = 0xB,
    /// Program Change
    ProgramChange = 0xC,
    /// Channel aftertouch
    AfterTouchChannel = 0xD,
    /// Pitch Bend
    PitchBend = 0xE,
    /// Single byte
    SingleByte = 0xF,
}

impl Cin {
    /// Single-byte system common shares its code with a one-byte sysex end
    pub const SYSTEM_COMMON_1_BYTE: Self = Self::SysExEnd1Byte;

    /// Convert from the low nibble of a header byte
    ///
    /// The high nibble is ignored, so this is total.
    #[must_use]
    pub const fn from_nibble(value: u8) -> Self {
        match value & 0x0F {
            0x0 => Self::Misc,
            0x1 => Self::CableEvent,
            0x2 => Self::SystemCommon2Byte,
            0x3 => Self::SystemCommon3Byte,
            0x4 => Self::SysExStart,
            0x5 => Self::SysExEnd1Byte,
            0x6 => Self::SysExEnd2Byte,
            0x7 => Self::SysExEnd3Byte,
            0x8 => Self::NoteOff,
            0x9 => Self::NoteOn,
            0xA => Self::AfterTouchPoly,
            0xB => Self::ControlChange,
            0xC => Self::ProgramChange,
            0xD => Self::AfterTouchChannel,
            0xE => Self::PitchBend,
            _ => Self::SingleByte,
        }
    }

    /// Sysex end code for a final group holding `len` bytes (1-3)
    #[must_use]
    pub const fn sysex_end(len: usize) -> Self {
        match len {
            0 | 1 => Self::SysExEnd1Byte,
            2 => Self::SysExEnd2Byte,
            _ => Self::SysExEnd3Byte,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Number of meaningful payload bytes in a packet with this code
    ///
    /// Reserved codes have no defined length.
    #[must_use]
    pub const fn payload_len(self) -> Option<usize> {
        match self {
            Self::Misc | Self::CableEvent => None,
            Self::SysExEnd1Byte | Self::SingleByte => Some(1),
            Self::SystemCommon2Byte
            | Self::SysExEnd2Byte
            | Self::ProgramChange
            | Self::AfterTouchChannel => Some(2),
            Self::SystemCommon3Byte
            | Self::SysExStart
            | Self::SysExEnd3Byte
            | Self::NoteOff
            | Self::NoteOn
            | Self::AfterTouchPoly
            | Self::ControlChange
            | Self::PitchBend => Some(3),
        }
    }

    /// Check if this code terminates a sysex stream
    #[must_use]
    pub const fn is_sysex_end(self) -> bool {
        matches!(
            self,
            Self::SysExEnd1Byte | Self::SysExEnd2Byte | Self::SysExEnd3Byte
        )
    }
}

impl fmt::Display for Cin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.as_u8())
    }
}

/// Virtual cable number (0-15) multiplexed over one USB endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cable(pub(crate) u8);

impl Cable {
    /// Highest addressable cable
    pub const MAX: u8 = 0x0F;

    /// Create a cable number, rejecting values above [`Cable::MAX`]
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Cable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

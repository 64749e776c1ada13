//! USB-MIDI error types

use std::io;

use thiserror::Error;

use super::Packet;

/// USB-MIDI transport errors
#[derive(Error, Debug)]
pub enum Error {
    /// Hardware failed to initialize
    #[error("hardware init failed: {0}")]
    Init(#[source] io::Error),

    /// Hardware failed to shut down
    #[error("hardware deinit failed: {0}")]
    Deinit(#[source] io::Error),

    /// Hardware rejected an outbound packet
    #[error("failed to write packet {packet}: {source}")]
    Write {
        /// Packet that was rejected
        packet: Packet,
        /// Underlying hardware error
        #[source]
        source: io::Error,
    },

    /// Buffer too small
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// MIDI channel outside 1-16
    #[error("invalid MIDI channel: {channel} (expected 1-16)")]
    InvalidChannel {
        /// Rejected channel
        channel: u8,
    },

    /// Message type not valid for the requested operation
    #[error("invalid message type: {type_byte:#x}")]
    InvalidMessageType {
        /// Status byte of the rejected type
        type_byte: u8,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

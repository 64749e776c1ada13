//! USB-MIDI packetizer/depacketizer.
//!
//! Each direction buffers a single packet. Outbound bytes are assembled into
//! the current packet and handed to the hardware on flush; inbound packets are
//! fetched only once every byte of the previous one has been delivered.

use tracing::{debug, instrument, trace};

use super::{Hardware, Metrics, Transport};
use crate::protocol::{
    Cable, Cin, Error, MessageType, PACKET_PAYLOAD_SIZE, Packet, Result, SYSEX_START, SYSEX_STOP,
};

/// USB-MIDI transport configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsbConfig {
    /// Virtual cable stamped on every outbound packet.
    pub cable: Cable,
}

/// USB-MIDI transport codec over a packet-level [`Hardware`].
#[derive(Debug)]
pub struct UsbMidi<H> {
    hardware: H,
    cable: Cable,

    active_type: Option<MessageType>,
    tx_buffer: Packet,
    tx_index: usize,

    rx_buffer: [u8; PACKET_PAYLOAD_SIZE],
    rx_index: usize,

    metrics: Metrics,
}

impl<H: Hardware> UsbMidi<H> {
    /// Create a transport on cable 0.
    pub fn new(hardware: H) -> Self {
        Self::with_config(hardware, UsbConfig::default())
    }

    /// Create a transport with explicit configuration.
    pub fn with_config(hardware: H, config: UsbConfig) -> Self {
        Self {
            hardware,
            cable: config.cable,
            active_type: None,
            tx_buffer: Packet::default(),
            tx_index: 0,
            rx_buffer: [0; PACKET_PAYLOAD_SIZE],
            rx_index: 0,
            metrics: Metrics::default(),
        }
    }

    /// Reset both directions and initialize the hardware.
    pub fn init(&mut self) -> Result<()> {
        self.tx_index = 0;
        self.rx_index = 0;

        self.hardware.init().map_err(Error::Init)
    }

    /// Shut the hardware down.
    pub fn deinit(&mut self) -> Result<()> {
        self.hardware.deinit().map_err(Error::Deinit)
    }

    /// Start a new outbound message.
    ///
    /// The packet header is derived from `msg_type` and the configured cable;
    /// the payload starts zeroed.
    pub fn begin_transmission(&mut self, msg_type: MessageType) {
        self.active_type = Some(msg_type);
        self.tx_buffer = Packet::new(self.cable, msg_type.cin(), [0; PACKET_PAYLOAD_SIZE]);
        self.tx_index = 0;
        self.metrics.record_transmission();
    }

    /// Append one byte to the message in progress.
    ///
    /// Sysex streams are split into groups of three bytes. A full group is
    /// sent immediately unless its last byte is the `0xF7` terminator; the
    /// terminator rewrites the header to the matching end code and leaves the
    /// flush to [`UsbMidi::end_transmission`].
    ///
    /// Fails only when an automatic flush was rejected by the hardware.
    pub fn write(&mut self, byte: u8) -> Result<()> {
        let mut result = Ok(());

        if self.active_type != Some(MessageType::SysEx) {
            if !self.tx_buffer.set_data(self.tx_index, byte) {
                debug!(
                    byte,
                    index = self.tx_index,
                    msg_type = ?self.active_type,
                    "byte past end of fixed-length message ignored"
                );
            }
        } else if byte == SYSEX_START {
            // start marker always opens a fresh group
            self.tx_buffer = Packet::new(self.cable, Cin::SysExStart, [byte, 0, 0]);
            self.tx_index = 0;
        } else {
            let position = self.tx_index % PACKET_PAYLOAD_SIZE;

            if byte == SYSEX_STOP {
                self.tx_buffer
                    .set_header(self.cable, Cin::sysex_end(position + 1));
            }

            match position {
                0 => {
                    self.tx_buffer.set_data(0, byte);
                    self.tx_buffer.set_data(1, 0);
                    self.tx_buffer.set_data(2, 0);
                }
                1 => {
                    self.tx_buffer.set_data(1, byte);
                    self.tx_buffer.set_data(2, 0);
                }
                _ => {
                    self.tx_buffer.set_data(2, byte);

                    if byte != SYSEX_STOP {
                        result = self.end_transmission();
                    }
                }
            }
        }

        self.tx_index += 1;

        result
    }

    /// Hand the packet being assembled to the hardware.
    #[instrument(level = "trace", skip(self), fields(packet = %self.tx_buffer))]
    pub fn end_transmission(&mut self) -> Result<()> {
        let packet = self.tx_buffer;

        match self.hardware.write(packet) {
            Ok(()) => {
                self.metrics.record_sent();
                trace!("packet sent");
                Ok(())
            }
            Err(source) => {
                self.metrics.record_write_failure();
                debug!(error = %source, "hardware rejected packet");
                Err(Error::Write { packet, source })
            }
        }
    }

    /// Next received byte.
    ///
    /// A packet is fetched from the hardware only when every byte of the
    /// previous one has been delivered. Returns `None` when the hardware has
    /// nothing to offer or delivered a packet with a reserved code index,
    /// which is dropped.
    pub fn read(&mut self) -> Option<u8> {
        if self.rx_index == 0 {
            let packet = self.hardware.read()?;

            let Some(payload) = packet.payload() else {
                self.metrics.record_dropped();
                debug!(%packet, cin = %packet.cin(), "dropping packet with reserved code index");
                return None;
            };

            // stored back to front so delivery can pop from the end
            for (slot, &byte) in self.rx_buffer.iter_mut().zip(payload.iter().rev()) {
                *slot = byte;
            }
            self.rx_index = payload.len();

            self.metrics.record_received();
            trace!(%packet, "packet received");
        }

        self.rx_index -= 1;
        Some(self.rx_buffer[self.rx_index])
    }

    /// Bytes of the last received packet not yet delivered.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.rx_index
    }

    /// Cable stamped on outbound packets.
    #[must_use]
    pub const fn cable(&self) -> Cable {
        self.cable
    }

    /// Snapshot of the packet counters.
    #[must_use]
    pub const fn metrics(&self) -> Metrics {
        self.metrics
    }

    /// Access the hardware.
    #[must_use]
    pub const fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Mutably access the hardware.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Consume the transport and return the hardware.
    pub fn into_hardware(self) -> H {
        self.hardware
    }
}

impl<H: Hardware> Transport for UsbMidi<H> {
    fn init(&mut self) -> Result<()> {
        UsbMidi::init(self)
    }

    fn deinit(&mut self) -> Result<()> {
        UsbMidi::deinit(self)
    }

    fn begin_transmission(&mut self, msg_type: MessageType) {
        UsbMidi::begin_transmission(self, msg_type);
    }

    fn write(&mut self, byte: u8) -> Result<()> {
        UsbMidi::write(self, byte)
    }

    fn end_transmission(&mut self) -> Result<()> {
        UsbMidi::end_transmission(self)
    }

    fn read(&mut self) -> Option<u8> {
        UsbMidi::read(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use crate::transport::Loopback;

    fn transport() -> UsbMidi<Loopback> {
        let mut usb = UsbMidi::new(Loopback::new());
        usb.init().unwrap();
        usb
    }

    fn write_all(usb: &mut UsbMidi<Loopback>, msg_type: MessageType, bytes: &[u8]) {
        usb.begin_transmission(msg_type);
        for &byte in bytes {
            usb.write(byte).unwrap();
        }
    }

    fn drain(usb: &mut UsbMidi<Loopback>) -> Vec<u8> {
        std::iter::from_fn(|| usb.read()).collect()
    }

    #[test]
    fn test_note_on_packet() {
        let mut usb = transport();
        write_all(&mut usb, MessageType::NoteOn, &[0x90, 0x3C, 0x7F]);

        // fixed-length messages wait for the explicit flush
        assert_eq!(usb.hardware().queued(), 0);
        usb.end_transmission().unwrap();

        let packet = usb.hardware_mut().pop().unwrap();
        assert_eq!(packet.to_bytes(), [0x09, 0x90, 0x3C, 0x7F]);
    }

    #[test]
    fn test_unwritten_slots_are_zero() {
        let mut usb = transport();

        // leave stale bytes behind in the tx buffer
        write_all(&mut usb, MessageType::ControlChange, &[0xB0, 0x07, 0x64]);
        usb.end_transmission().unwrap();

        write_all(&mut usb, MessageType::NoteOn, &[0x3C, 0x7F]);
        usb.end_transmission().unwrap();

        let packets = usb.hardware_mut().drain();
        assert_eq!(packets[1].to_bytes(), [0x09, 0x3C, 0x7F, 0x00]);

        // the note-on class is three bytes, so all three come back
        let mut usb = transport();
        usb.hardware_mut().push(packets[1]);
        assert_eq!(drain(&mut usb), vec![0x3C, 0x7F, 0x00]);
    }

    #[test]
    fn test_program_change_roundtrip() {
        let mut usb = transport();
        write_all(&mut usb, MessageType::ProgramChange, &[0xC3, 0x10]);
        usb.end_transmission().unwrap();

        assert_eq!(drain(&mut usb), vec![0xC3, 0x10]);
    }

    #[test]
    fn test_cable_in_header() {
        let config = UsbConfig {
            cable: Cable::new(5).unwrap(),
        };
        let mut usb = UsbMidi::with_config(Loopback::new(), config);
        usb.init().unwrap();

        write_all(&mut usb, MessageType::Clock, &[0xF8]);
        usb.end_transmission().unwrap();

        let packet = usb.hardware_mut().pop().unwrap();
        assert_eq!(packet.to_bytes(), [0x5F, 0xF8, 0x00, 0x00]);
        assert_eq!(packet.cable(), usb.cable());
    }

    #[test]
    fn test_sysex_four_bytes() {
        let mut usb = transport();

        usb.begin_transmission(MessageType::SysEx);
        usb.write(0xF0).unwrap();
        usb.write(0x01).unwrap();
        assert_eq!(usb.hardware().queued(), 0);

        // third byte of a full group flushes immediately
        usb.write(0x02).unwrap();
        assert_eq!(usb.hardware().queued(), 1);

        // terminator alone in its group waits for the caller
        usb.write(0xF7).unwrap();
        assert_eq!(usb.hardware().queued(), 1);
        usb.end_transmission().unwrap();

        let packets = usb.hardware_mut().drain();
        assert_eq!(packets[0].to_bytes(), [0x04, 0xF0, 0x01, 0x02]);
        assert_eq!(packets[1].to_bytes(), [0x05, 0xF7, 0x00, 0x00]);

        for packet in packets {
            usb.hardware_mut().push(packet);
        }
        assert_eq!(drain(&mut usb), vec![0xF0, 0x01, 0x02, 0xF7]);
    }

    #[test]
    fn test_sysex_end_codes() {
        let cases: [(&[u8], Cin); 3] = [
            (&[0xF0, 0x01, 0x02, 0xF7], Cin::SysExEnd1Byte),
            (&[0xF0, 0x01, 0x02, 0x03, 0xF7], Cin::SysExEnd2Byte),
            (&[0xF0, 0x01, 0x02, 0x03, 0x04, 0xF7], Cin::SysExEnd3Byte),
        ];

        for (bytes, expected) in cases {
            let mut usb = transport();
            write_all(&mut usb, MessageType::SysEx, bytes);
            usb.end_transmission().unwrap();

            let packets = usb.hardware_mut().drain();
            assert_eq!(packets.len(), 2);
            assert_eq!(packets[0].cin(), Cin::SysExStart);
            assert_eq!(packets[1].cin(), expected);
        }
    }

    #[test]
    fn test_empty_sysex_single_packet() {
        let mut usb = transport();
        write_all(&mut usb, MessageType::SysEx, &[0xF0, 0xF7]);
        assert_eq!(usb.hardware().queued(), 0);
        usb.end_transmission().unwrap();

        let packet = usb.hardware_mut().pop().unwrap();
        assert_eq!(packet.to_bytes(), [0x06, 0xF0, 0xF7, 0x00]);
    }

    #[test]
    fn test_terminator_completing_group_not_flushed() {
        let mut usb = transport();
        write_all(&mut usb, MessageType::SysEx, &[0xF0, 0x01, 0xF7]);

        assert_eq!(usb.hardware().queued(), 0);
        usb.end_transmission().unwrap();

        let packet = usb.hardware_mut().pop().unwrap();
        assert_eq!(packet.to_bytes(), [0x07, 0xF0, 0x01, 0xF7]);
    }

    #[test]
    fn test_auto_flush_failure_reported() {
        let mut usb = transport();
        usb.hardware_mut().fail_writes(true);

        usb.begin_transmission(MessageType::SysEx);
        usb.write(0xF0).unwrap();
        usb.write(0x01).unwrap();
        let result = usb.write(0x02);

        assert!(matches!(result, Err(Error::Write { .. })));
        assert_eq!(usb.metrics().write_failures(), 1);

        // the index still advanced, so the next group starts cleanly
        usb.hardware_mut().fail_writes(false);
        usb.write(0x03).unwrap();
        usb.write(0xF7).unwrap();
        usb.end_transmission().unwrap();

        let packet = usb.hardware_mut().pop().unwrap();
        assert_eq!(packet.to_bytes(), [0x06, 0x03, 0xF7, 0x00]);
    }

    #[test]
    fn test_end_transmission_failure() {
        let mut usb = transport();
        usb.hardware_mut().fail_writes(true);

        write_all(&mut usb, MessageType::NoteOff, &[0x80, 0x3C, 0x00]);
        let err = usb.end_transmission().unwrap_err();

        match err {
            Error::Write { packet, .. } => {
                assert_eq!(packet.to_bytes(), [0x08, 0x80, 0x3C, 0x00]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overflow_bytes_ignored() {
        let mut usb = transport();
        write_all(&mut usb, MessageType::Clock, &[0xF8, 0x11, 0x22, 0x33]);
        usb.end_transmission().unwrap();

        let packet = usb.hardware_mut().pop().unwrap();
        assert_eq!(packet.to_bytes(), [0x0F, 0xF8, 0x11, 0x22]);
    }

    #[test]
    fn test_read_without_packet() {
        let mut usb = transport();

        for _ in 0..3 {
            assert_eq!(usb.read(), None);
            assert_eq!(usb.pending(), 0);
        }
        assert_eq!(usb.metrics().packets_received(), 0);
    }

    #[test]
    fn test_reserved_cin_dropped() {
        let mut usb = transport();
        usb.hardware_mut().push(Packet::from([0x00, 0x11, 0x22, 0x33]));
        usb.hardware_mut().push(Packet::from([0x21, 0x44, 0x55, 0x66]));
        usb.hardware_mut().push(Packet::from([0x0F, 0xFA, 0x00, 0x00]));

        assert_eq!(usb.read(), None);
        assert_eq!(usb.pending(), 0);
        assert_eq!(usb.read(), None);
        assert_eq!(usb.read(), Some(0xFA));
        assert_eq!(usb.metrics().packets_dropped(), 2);
        assert_eq!(usb.metrics().packets_received(), 1);
    }

    #[test]
    fn test_fetches_only_when_drained() {
        let mut usb = transport();
        usb.hardware_mut().push(Packet::from([0x09, 0x90, 0x3C, 0x7F]));
        usb.hardware_mut().push(Packet::from([0x08, 0x80, 0x3C, 0x00]));

        assert_eq!(usb.read(), Some(0x90));
        assert_eq!(usb.pending(), 2);
        assert_eq!(usb.hardware().queued(), 1);

        assert_eq!(usb.read(), Some(0x3C));
        assert_eq!(usb.read(), Some(0x7F));
        assert_eq!(usb.pending(), 0);
        assert_eq!(usb.hardware().queued(), 1);

        assert_eq!(usb.read(), Some(0x80));
        assert_eq!(usb.hardware().queued(), 0);
    }

    #[test]
    fn test_receive_ignores_cable() {
        let mut usb = transport();
        usb.hardware_mut().push(Packet::from([0xFC, 0xC0, 0x05, 0x99]));

        assert_eq!(drain(&mut usb), vec![0xC0, 0x05]);
    }

    #[test]
    fn test_init_resets_state() {
        let mut usb = transport();
        usb.hardware_mut().push(Packet::from([0x09, 0x90, 0x3C, 0x7F]));
        assert_eq!(usb.read(), Some(0x90));
        assert_eq!(usb.pending(), 2);

        usb.init().unwrap();
        assert_eq!(usb.pending(), 0);
        assert!(usb.hardware().is_initialized());

        // interrupt a sysex stream two bytes in
        write_all(&mut usb, MessageType::SysEx, &[0xF0, 0x01]);
        usb.init().unwrap();

        // grouping restarts at the first slot
        for byte in [0x10, 0x11, 0x12] {
            usb.write(byte).unwrap();
        }
        let packet = usb.hardware_mut().pop().unwrap();
        assert_eq!(packet.to_bytes(), [0x04, 0x10, 0x11, 0x12]);

        usb.deinit().unwrap();
        assert!(!usb.hardware().is_initialized());
    }

    #[test]
    fn test_sysex_start_restarts_packet() {
        let mut usb = transport();
        write_all(&mut usb, MessageType::SysEx, &[0xF0, 0x01]);

        // second start marker lands at a non-zero index
        for byte in [0xF0, 0x02, 0x03, 0xF7] {
            usb.write(byte).unwrap();
        }
        usb.end_transmission().unwrap();

        let packets: Vec<_> = usb
            .hardware_mut()
            .drain()
            .iter()
            .map(Packet::to_bytes)
            .collect();
        assert_eq!(
            packets,
            vec![[0x04, 0xF0, 0x02, 0x03], [0x05, 0xF7, 0x00, 0x00]]
        );
    }

    #[test]
    fn test_send_all_in_order() {
        let mut usb = transport();
        let messages = Message::nrpn(0x0101, 0x1234, 1, true).unwrap();

        usb.send_all(&messages).unwrap();
        assert_eq!(usb.metrics().transmissions(), 4);

        let expected: Vec<u8> = messages
            .iter()
            .flat_map(|m| m.as_bytes().iter().copied())
            .collect();
        assert_eq!(drain(&mut usb), expected);
    }

    #[test]
    fn test_send_message() {
        let mut usb = transport();
        let message = Message::sysex(&[0x7E, 0x00, 0x06, 0x01]);

        Transport::send(&mut usb, &message).unwrap();
        assert_eq!(usb.hardware().queued(), 2);
        assert_eq!(usb.metrics().packets_sent(), 2);
        assert_eq!(usb.metrics().transmissions(), 1);

        assert_eq!(drain(&mut usb), message.as_bytes());
    }

    // Property-based tests
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn fixed_type_strategy() -> impl Strategy<Value = MessageType> {
            proptest::sample::select(
                MessageType::ALL
                    .into_iter()
                    .filter(|t| *t != MessageType::SysEx)
                    .collect::<Vec<_>>(),
            )
        }

        proptest! {
            /// Property: any fixed-length payload comes back unchanged
            #[test]
            fn prop_fixed_length_roundtrip(
                msg_type in fixed_type_strategy(),
                payload in prop::collection::vec(any::<u8>(), 3),
            ) {
                let len = msg_type.payload_len().unwrap();
                let payload = &payload[..len];

                let mut usb = transport();
                write_all(&mut usb, msg_type, payload);
                usb.end_transmission().unwrap();

                prop_assert_eq!(usb.hardware().queued(), 1);
                prop_assert_eq!(drain(&mut usb), payload.to_vec());
            }

            /// Property: sysex streams of any length survive packetization
            #[test]
            fn prop_sysex_roundtrip(data in prop::collection::vec(0u8..0x80, 0..256)) {
                let message = Message::sysex(&data);

                let mut usb = transport();
                usb.send(&message).unwrap();

                let packets = usb.hardware_mut().drain();
                prop_assert_eq!(packets.len(), message.len().div_ceil(3));

                let (last, body) = packets.split_last().unwrap();
                prop_assert!(body.iter().all(|p| p.cin() == Cin::SysExStart));
                let tail = (message.len() - 1) % 3 + 1;
                prop_assert_eq!(last.cin(), Cin::sysex_end(tail));

                for packet in packets {
                    usb.hardware_mut().push(packet);
                }
                prop_assert_eq!(drain(&mut usb), message.as_bytes().to_vec());
            }

            /// Property: only the third non-terminator byte of a group flushes
            #[test]
            fn prop_auto_flush_boundary(data in prop::collection::vec(0u8..0x80, 0..64)) {
                let mut usb = transport();
                usb.begin_transmission(MessageType::SysEx);

                let stream = std::iter::once(SYSEX_START).chain(data.iter().copied());
                for (index, byte) in stream.enumerate() {
                    let before = usb.hardware().queued();
                    usb.write(byte).unwrap();
                    let flushed = usb.hardware().queued() - before;
                    prop_assert_eq!(flushed, usize::from(index % 3 == 2));
                }

                let before = usb.hardware().queued();
                usb.write(SYSEX_STOP).unwrap();
                prop_assert_eq!(usb.hardware().queued(), before);
            }

            /// Property: every code index used on transmit is accepted on receive
            #[test]
            fn prop_transmit_cins_decodable(msg_type in fixed_type_strategy()) {
                let cin = msg_type.cin();
                prop_assert_eq!(cin.payload_len(), msg_type.payload_len());

                let mut usb = transport();
                usb.hardware_mut().push(Packet::new(Cable::default(), cin, [1, 2, 3]));
                prop_assert!(usb.read().is_some());
                prop_assert_eq!(usb.pending() + 1, msg_type.payload_len().unwrap());
            }
        }
    }
}

//! # Relay Header
//!
//! Framing the server uses when it forwards one player's frame to other
//! clients: whose frame it is, and that player's latency.
//!
//! ```text
//! subject (17) │ resync │ time │ ?latency [compressed ms] │ controller ...
//! ```
//!
//! The subject is plain framing and carries no state. Latency is diffed
//! against the connection baselines like any other field, so it only
//! commits with a fully written frame and only applies once the frame is
//! admitted.

use deltasync_core::{BitReader, BitWriter, EntityRef};

use super::codec::{DecodeOutcome, EncodeReport, FrameCodec};
use super::events::EventSink;
use super::snapshot::{ConnectionSyncState, TimeToken};
use crate::error::FrameResult;
use crate::integration::{EntityDirectory, SyncedPlayer};
use crate::protocol::SyncFrame;

/// Who a relayed frame is about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayHeader {
    /// Player the frame describes.
    pub subject: Option<EntityRef>,
    /// That player's latency in milliseconds.
    pub latency: u32,
}

impl FrameCodec {
    /// Encodes a frame forwarded on behalf of `header.subject`.
    ///
    /// Same commit rules as [`FrameCodec::encode_frame`]: on error neither
    /// the latency nor any other field reaches `last_sent`.
    pub fn encode_relayed<W: EntityDirectory + ?Sized>(
        &self,
        writer: &mut BitWriter,
        header: &RelayHeader,
        frame: &SyncFrame,
        time_token: TimeToken,
        state: &mut ConnectionSyncState,
        world: &W,
    ) -> FrameResult<EncodeReport> {
        let start = writer.bits_written();
        writer.write_entity(header.subject)?;
        let mut report = self.encode_with_latency(
            writer,
            frame,
            time_token,
            Some(header.latency),
            state,
            world,
        )?;
        report.bits_written = writer.bits_written() - start;
        Ok(report)
    }

    /// Decodes a relayed frame into `player`.
    ///
    /// Returns the subject alongside the outcome. The subject is returned
    /// even for rejected frames; the latency is in the applied
    /// [`FrameReport`](super::FrameReport).
    pub fn decode_relayed<P, W, S>(
        &self,
        reader: &mut BitReader,
        state: &mut ConnectionSyncState,
        player: &mut P,
        world: &W,
        sink: &mut S,
    ) -> FrameResult<(Option<EntityRef>, DecodeOutcome)>
    where
        P: SyncedPlayer + ?Sized,
        W: EntityDirectory + ?Sized,
        S: EventSink + ?Sized,
    {
        let start = reader.bits_read();
        let subject = reader.read_entity()?;
        let mut outcome = self.decode_with_latency(reader, true, state, player, world, sink)?;
        if let DecodeOutcome::Applied(report) = &mut outcome {
            report.bits_read = reader.bits_read() - start;
        }
        Ok((subject, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{EmptyWorld, PlayerRecord};
    use crate::protocol::WeaponFrame;
    use crate::sync::{RejectReason, SyncEvent};
    use deltasync_core::ENTITY_REF_BITS;

    fn relay(
        codec: &FrameCodec,
        header: &RelayHeader,
        time: TimeToken,
        sender: &mut ConnectionSyncState,
        receiver: &mut ConnectionSyncState,
    ) -> (EncodeReport, Option<EntityRef>, DecodeOutcome) {
        let mut writer = BitWriter::new();
        let report = codec
            .encode_relayed(&mut writer, header, &SyncFrame::default(), time, sender, &EmptyWorld)
            .unwrap();
        let mut player = PlayerRecord::spawned();
        let mut events: Vec<SyncEvent> = Vec::new();
        let mut reader = BitReader::new(writer.as_slice());
        let (subject, outcome) = codec
            .decode_relayed(&mut reader, receiver, &mut player, &EmptyWorld, &mut events)
            .unwrap();
        (report, subject, outcome)
    }

    #[test]
    fn test_latency_sent_once() {
        let codec = FrameCodec::default();
        let mut sender = ConnectionSyncState::new();
        let mut receiver = ConnectionSyncState::new();
        let header = RelayHeader {
            subject: EntityRef::new(42),
            latency: 180,
        };

        let (first, subject, outcome) = relay(&codec, &header, 1, &mut sender, &mut receiver);
        assert!(first.changes.latency);
        assert_eq!(subject, header.subject);
        match outcome {
            DecodeOutcome::Applied(report) => {
                assert_eq!(report.bits_read, first.bits_written);
                assert_eq!(report.latency, Some(180));
            }
            DecodeOutcome::Rejected(reason) => panic!("rejected: {reason}"),
        }

        let (second, _, outcome) = relay(&codec, &header, 2, &mut sender, &mut receiver);
        assert!(!second.changes.latency);
        match outcome {
            DecodeOutcome::Applied(report) => assert_eq!(report.latency, Some(180)),
            DecodeOutcome::Rejected(reason) => panic!("rejected: {reason}"),
        }
        assert_eq!(sender.last_sent, receiver.last_received);
    }

    #[test]
    fn test_relayed_frame_size() {
        let codec = FrameCodec::default();
        let mut plain = ConnectionSyncState::new();
        let mut relayed = ConnectionSyncState::new();

        let mut writer = BitWriter::new();
        let bare = codec
            .encode_frame(&mut writer, &SyncFrame::default(), 1, &mut plain, &EmptyWorld)
            .unwrap();
        let mut writer = BitWriter::new();
        let header = RelayHeader::default();
        let framed = codec
            .encode_relayed(&mut writer, &header, &SyncFrame::default(), 1, &mut relayed, &EmptyWorld)
            .unwrap();

        // subject plus an unset latency bit
        assert_eq!(
            framed.bits_written,
            bare.bits_written + usize::from(ENTITY_REF_BITS) + 1
        );
        assert_eq!(writer.bits_written(), framed.bits_written);
    }

    #[test]
    fn test_stale_relayed_frame_keeps_latency() {
        let codec = FrameCodec::default();
        let mut sender = ConnectionSyncState::new();
        let mut receiver = ConnectionSyncState::new();
        let mut header = RelayHeader {
            subject: EntityRef::new(7),
            latency: 50,
        };
        relay(&codec, &header, 5, &mut sender, &mut receiver);
        let before = receiver.clone();

        // duplicate time token carrying a new latency
        header.latency = 999;
        let (_, subject, outcome) = relay(&codec, &header, 5, &mut sender, &mut receiver);

        assert_eq!(subject, header.subject);
        assert!(matches!(
            outcome,
            DecodeOutcome::Rejected(RejectReason::Stale { .. })
        ));
        assert_eq!(receiver, before);
        assert_eq!(receiver.last_received.latency, 50);
    }

    #[test]
    fn test_failed_relay_encode_keeps_latency() {
        let codec = FrameCodec::default();
        let mut state = ConnectionSyncState::new();
        let header = RelayHeader {
            subject: EntityRef::new(7),
            latency: 70,
        };
        let frame = SyncFrame {
            weapon: Some(WeaponFrame {
                slot: 40,
                ..WeaponFrame::default()
            }),
            ..SyncFrame::default()
        };

        let mut writer = BitWriter::new();
        assert!(codec
            .encode_relayed(&mut writer, &header, &frame, 1, &mut state, &EmptyWorld)
            .is_err());
        assert_eq!(state.last_sent.latency, 0);
    }

    #[test]
    fn test_truncated_header() {
        let codec = FrameCodec::default();
        let mut receiver = ConnectionSyncState::new();
        let mut player = PlayerRecord::spawned();
        let mut events: Vec<SyncEvent> = Vec::new();
        let mut reader = BitReader::new(&[0xFF]);
        assert!(codec
            .decode_relayed(&mut reader, &mut receiver, &mut player, &EmptyWorld, &mut events)
            .is_err());
        assert_eq!(receiver, ConnectionSyncState::new());
    }
}

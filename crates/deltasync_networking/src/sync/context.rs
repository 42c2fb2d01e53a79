//! # Context Validator
//!
//! Decides whether an inbound frame may touch any state at all.
//!
//! Runs before the first field is read. A frame encoded against another
//! baseline generation, or one that arrives out of order, is turned away
//! without mutating the player or the baseline.

use deltasync_core::BitReader;

use super::snapshot::{is_newer, ConnectionSyncState, ResyncToken, TimeToken};
use crate::error::FrameResult;

/// Why a frame was turned away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The frame belongs to another baseline generation.
    ResyncMismatch {
        /// Generation this side is in.
        expected: ResyncToken,
        /// Generation the frame was encoded in.
        received: ResyncToken,
    },
    /// The frame is not newer than the last accepted one.
    Stale {
        /// Last accepted time token.
        last: TimeToken,
        /// Token on the rejected frame.
        received: TimeToken,
    },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResyncMismatch { expected, received } => {
                write!(f, "resync token {received}, expected {expected}")
            }
            Self::Stale { last, received } => {
                write!(f, "time token {received} not newer than {last}")
            }
        }
    }
}

/// Outcome of the context check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Decode may proceed. The token is already stored.
    Admitted(TimeToken),
    /// Drop the frame.
    Rejected(RejectReason),
}

/// Compares a frame's resync token against the connection's.
pub fn check_resync(
    state: &ConnectionSyncState,
    received: ResyncToken,
) -> Result<(), RejectReason> {
    let expected = state.resync_token();
    if expected == received {
        Ok(())
    } else {
        Err(RejectReason::ResyncMismatch { expected, received })
    }
}

/// Accepts a time token if it is newer than the last one, storing it.
///
/// The first frame on a connection is always accepted.
pub fn admit_time_token(
    state: &mut ConnectionSyncState,
    received: TimeToken,
) -> Result<(), RejectReason> {
    if let Some(last) = state.last_time_token() {
        if !is_newer(received, last) {
            return Err(RejectReason::Stale { last, received });
        }
    }
    state.store_time_token(received);
    Ok(())
}

/// Reads both context tokens and validates them.
///
/// The time token is not read once the resync token has failed.
pub fn read_context(
    reader: &mut BitReader,
    state: &mut ConnectionSyncState,
) -> FrameResult<Admission> {
    let resync = ResyncToken::read(reader)?;
    if let Err(reason) = check_resync(state, resync) {
        return Ok(Admission::Rejected(reason));
    }

    let time = reader.read_u8()?;
    Ok(match admit_time_token(state, time) {
        Ok(()) => Admission::Admitted(time),
        Err(reason) => Admission::Rejected(reason),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltasync_core::BitWriter;

    fn context(resync: ResyncToken, time: TimeToken) -> BitWriter {
        let mut writer = BitWriter::new();
        resync.write(&mut writer).unwrap();
        writer.write_u8(time).unwrap();
        writer
    }

    #[test]
    fn test_first_frame_admitted() {
        let mut state = ConnectionSyncState::new();
        let writer = context(ResyncToken::default(), 200);
        let mut reader = BitReader::new(writer.as_slice());

        let admission = read_context(&mut reader, &mut state).unwrap();
        assert_eq!(admission, Admission::Admitted(200));
        assert_eq!(state.last_time_token(), Some(200));
    }

    #[test]
    fn test_equal_token_is_stale() {
        let mut state = ConnectionSyncState::new();
        admit_time_token(&mut state, 5).unwrap();

        assert_eq!(
            admit_time_token(&mut state, 5),
            Err(RejectReason::Stale {
                last: 5,
                received: 5
            })
        );
        assert_eq!(state.last_time_token(), Some(5));
    }

    #[test]
    fn test_wrapped_token_admitted() {
        let mut state = ConnectionSyncState::new();
        admit_time_token(&mut state, 254).unwrap();
        assert!(admit_time_token(&mut state, 1).is_ok());
        assert_eq!(state.last_time_token(), Some(1));
    }

    #[test]
    fn test_resync_mismatch_leaves_time_token() {
        let mut state = ConnectionSyncState::new();
        admit_time_token(&mut state, 9).unwrap();

        let writer = context(ResyncToken::new(3), 10);
        let mut reader = BitReader::new(writer.as_slice());
        let admission = read_context(&mut reader, &mut state).unwrap();

        assert_eq!(
            admission,
            Admission::Rejected(RejectReason::ResyncMismatch {
                expected: ResyncToken::new(0),
                received: ResyncToken::new(3),
            })
        );
        assert_eq!(state.last_time_token(), Some(9));
    }
}

//! # Differential Sync
//!
//! Per-connection state and the codec that runs against it.
//!
//! ## Data Flow
//!
//! ```text
//! OUTBOUND:  live player ─→ SyncFrame::capture ─→ FrameCodec::encode_frame
//!                                                   │ diff vs last_sent
//!                                                   ↓
//!                                                 bits
//!
//! INBOUND:   bits ─→ read_context ─→ FrameCodec::decode_frame ─→ player
//!                     │ reject          │ diff vs last_received
//!                     ↓                 ↓
//!                   no-op           derive_events ─→ EventSink
//! ```

mod codec;
mod context;
mod events;
mod relay;
mod snapshot;
mod weapon;

pub use codec::{
    from_wire_space, to_wire_space, ChangeSet, DecodeOutcome, EncodeReport, FrameCodec,
    FrameReport,
};
pub use context::{admit_time_token, check_resync, read_context, Admission, RejectReason};
pub use events::{damage_amount, derive_events, EventSink, SyncEvent, VitalState};
pub use relay::RelayHeader;
pub use snapshot::{
    is_newer, ConnectionSyncState, ResyncToken, SyncSnapshot, TimeToken, WeaponSnapshot,
};
pub use weapon::{
    apply_unarmed, apply_weapon, check_weapon, read_weapon_block, write_weapon_block,
    WeaponBlock, WeaponChanges, WeaponVerdict,
};

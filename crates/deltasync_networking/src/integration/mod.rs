//! # Integration Layer
//!
//! How the codec plugs into a host's entity system.
//!
//! ```text
//! codec defines:          host implements:
//! ┌─────────────────┐     ┌─────────────────┐
//! │ SyncedPlayer    │ ←── │ its player type │
//! │ EntityDirectory │ ←── │ its world       │
//! │ EventSink       │ ←── │ its event bus   │
//! └─────────────────┘     └─────────────────┘
//! ```

mod player;
mod traits;

pub use player::PlayerRecord;
pub use traits::{EmptyWorld, EntityDirectory, SyncedPlayer};

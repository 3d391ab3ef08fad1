//! Round orchestration.
//!
//! - `Round`: the state machine wiring the Cantor, the bots and win detection
//! - Integrity auditing after every mark
//! - Typed events and plain data snapshots
//! - `RoundActor`: drives a round in real time behind an mpsc inbox

pub mod actor;
pub mod events;
pub mod integrity;
pub mod messages;
pub mod orchestrator;
pub mod state;

pub use actor::{RoundActor, RoundHandle};
pub use events::RoundEvent;
pub use integrity::{AuditReport, audit, verify};
pub use messages::{RoundMessage, RoundResponse};
pub use orchestrator::Round;
pub use state::{
    GameStats, MarkOutcome, PlayerProgress, RoundSnapshot, RoundState, RoundSummary,
};

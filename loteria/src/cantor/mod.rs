//! The Cantor: the component that calls the cards of a round.
//!
//! - Deck building and optional shuffling
//! - Timed calls with pause/resume
//! - Manual calls and exhaustion handling
//! - Named presets for the call interval

pub mod config;
pub mod manager;

pub use config::{CantorConfig, CantorConfigUpdate, CantorPreset, MIN_INTERVAL_MS};
pub use manager::{Cantor, CantorEvent, CantorPhase, CantorSnapshot, CantorStats};

//! Tournament snapshot, typed commands and the engine façade.
//!
//! This module provides:
//! - The caller-owned [`Tournament`] snapshot and its settings
//! - Typed [`Command`]s and the [`Delta`]s they produce
//! - [`TournamentEngine`], which runs commands against a snapshot
//! - The [`TournamentStore`] persistence seam for hosts
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use tt_engine::tournament::{
//!     Command, Participant, Tournament, TournamentEngine, TournamentFormat, TournamentSettings,
//! };
//!
//! let participants = vec![
//!     Participant::new(1, "Ada", 1850),
//!     Participant::new(2, "Bo", 1720),
//!     Participant::new(3, "Cy", 1690),
//! ];
//! let mut tournament = Tournament::new(
//!     "Thursday Ladder",
//!     TournamentSettings::new(TournamentFormat::Knockout),
//!     participants,
//! );
//!
//! let engine = TournamentEngine::default();
//! let outcome = engine
//!     .execute(&mut tournament, Command::GenerateBracket, Utc::now())
//!     .unwrap();
//! assert_eq!(outcome.created().count(), 3);
//! ```

pub mod commands;
pub mod engine;
pub mod errors;
pub mod models;
pub mod store;

pub use commands::{Command, CommandOutcome, Delta, MatchUpdate, apply_deltas};
pub use engine::{EngineConfig, TournamentEngine};
pub use errors::{EngineError, EngineResult};
pub use models::{
    Participant, ParticipantType, Tournament, TournamentFormat, TournamentPhase,
    TournamentSettings,
};
pub use store::{MemoryStore, StoreError, StoreResult, TournamentStore};

//! # tt_engine
//!
//! Scheduling and match-state engine for table-tennis tournaments.
//!
//! The engine is pure, synchronous logic over a caller-owned
//! [`Tournament`] snapshot. It performs no I/O and keeps no state between
//! calls; "now" is always passed in by the caller.
//!
//! ## Formats
//!
//! - **Knockout**: single elimination with byes for non-power-of-two fields
//! - **Double knockout**: winner bracket, loser bracket and a grand final
//! - **Round robin**: circle-method schedule
//! - **Group + knockout**: snake-seeded groups feeding a knockout
//! - **Swiss**: greedy pairing, one round at a time
//!
//! ## Core Modules
//!
//! - [`scoring`]: match entities and the set/score state machine
//! - [`bracket`]: generators, topologies and result propagation
//! - [`standings`]: ranked tables with tie-break chains
//! - [`table`]: table allocation with rest periods
//! - [`tournament`]: snapshot models, typed commands and the engine façade
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use tt_engine::{Command, Participant, Tournament, TournamentEngine, TournamentFormat,
//!     TournamentSettings};
//!
//! let participants = (1..=4)
//!     .map(|id| Participant::new(id, format!("Player {id}"), 2000 - id as i32))
//!     .collect();
//! let mut tournament = Tournament::new(
//!     "Spring Round Robin",
//!     TournamentSettings::new(TournamentFormat::RoundRobin),
//!     participants,
//! );
//!
//! let engine = TournamentEngine::default();
//! engine
//!     .execute(&mut tournament, Command::GenerateBracket, Utc::now())
//!     .unwrap();
//! assert_eq!(tournament.matches.len(), 6);
//! ```

/// Bracket generation, topologies and propagation.
pub mod bracket;

/// Match entities and score evaluation.
pub mod scoring;
pub use scoring::{Match, MatchId, MatchKey, MatchStatus, ParticipantId, Section, SetScore, Slot};

/// Standings and tie-breaks.
pub mod standings;
pub use standings::{Standing, StandingsScope, TieBreak};

/// Table allocation.
pub mod table;
pub use table::{AllocationRejection, TableAllocator};

/// Tournament snapshot, commands and engine.
pub mod tournament;
pub use tournament::{
    Command, CommandOutcome, Delta, EngineConfig, EngineError, EngineResult, MatchUpdate,
    MemoryStore, Participant, ParticipantType, Tournament, TournamentEngine, TournamentFormat,
    TournamentPhase, TournamentSettings, TournamentStore,
};

//! Standings tables derived from match results.

pub mod calculator;
pub mod models;

pub use calculator::compute_standings;
pub use models::{Standing, StandingsScope, TieBreak};

//! Bracket generation and propagation.

pub mod arena;
pub mod generator;
pub mod propagation;
pub mod seeding;
pub mod swiss;
pub mod topology;

pub use arena::MatchArena;
pub use generator::{
    bracket_slots, double_elimination, elimination_rounds, round_robin, single_elimination,
    swiss_opening,
};
pub use propagation::{resolve, retract};
pub use seeding::{cross_seed, draw_groups, group_count, ranked, ranked_ids};
pub use topology::{
    BracketTopology, DoubleElimination, Flat, SingleElimination, SlotSource, Topology,
};

//! Match entities and the score evaluation state machine.

pub mod entities;
pub mod state_machine;

pub use entities::{
    GRAND_FINAL_GROUP_NUMBER, LOSERS_GROUP_NUMBER, Match, MatchId, MatchKey, MatchStatus,
    ParticipantId, Section, SetScore, Slot, TableNumber,
};
pub use state_machine::{
    DEFAULT_BEST_OF, Evaluation, effective_best_of, evaluate, evaluate_best_of, is_upgraded,
    required_wins, set_winner, set_wins,
};

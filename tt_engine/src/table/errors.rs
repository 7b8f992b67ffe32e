//! Table allocation rejections.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{MatchId, ParticipantId, TableNumber};

/// Reason a match could not be put on a table.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AllocationRejection {
    #[error("Table {table} is occupied")]
    TableOccupied { table: TableNumber },

    #[error("Participant {participant} is still playing")]
    PlayerInPlay { participant: ParticipantId },

    #[error("Participant {participant} is resting for {remaining_minutes} more minute(s)")]
    PlayerResting {
        participant: ParticipantId,
        remaining_minutes: i64,
    },

    #[error("Table {table} does not exist (tables 1..={table_count})")]
    TableOutOfRange {
        table: TableNumber,
        table_count: u32,
    },

    #[error("No free table available")]
    NoTableAvailable,

    #[error("Match {match_id} not found")]
    MatchNotFound { match_id: MatchId },

    #[error("Match {match_id} is not ready to start")]
    MatchNotReady { match_id: MatchId },
}

impl AllocationRejection {
    /// Short message suitable for showing to organizers on a tablet.
    pub fn client_message(&self) -> String {
        match self {
            Self::TableOccupied { .. } => "Table occupied".to_string(),
            Self::PlayerInPlay { .. } => "Player still playing".to_string(),
            Self::PlayerResting {
                remaining_minutes, ..
            } => format!("Player resting ({remaining_minutes} min)"),
            _ => self.to_string(),
        }
    }
}

pub type AllocationResult<T> = Result<T, AllocationRejection>;

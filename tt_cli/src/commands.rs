//! Command-line arguments to engine commands.

use anyhow::{Context, Error};
use pico_args::Arguments;
use tt_engine::{Command, SetScore, scoring::MatchId};

/// Parse a score sheet such as `11-7,9-11,11:4`.
///
/// An empty sheet is valid and clears the entered sets.
pub fn parse_sets(raw: &str) -> Result<Vec<SetScore>, Error> {
    raw.split(',')
        .map(str::trim)
        .filter(|set| !set.is_empty())
        .map(|set| {
            let (first, second) = set
                .split_once(['-', ':'])
                .with_context(|| format!("set '{set}' must look like 11-7"))?;
            let points = |side: &str| -> Result<u32, Error> {
                side.trim()
                    .parse()
                    .with_context(|| format!("invalid points '{side}' in set '{set}'"))
            };
            Ok(SetScore::new(points(first)?, points(second)?))
        })
        .collect()
}

/// Engine command for the subcommand `name`, reading its own arguments.
///
/// Returns `None` when `name` is not an engine command.
pub fn engine_command(name: &str, args: &mut Arguments) -> Result<Option<Command>, Error> {
    let command = match name {
        "generate" => Command::GenerateBracket,
        "score" => {
            let match_id: MatchId = args.free_from_str().context("score needs a MATCH_ID")?;
            let sheet: Option<String> = args.opt_free_from_str()?;
            Command::EvaluateScore {
                match_id,
                sets: parse_sets(sheet.as_deref().unwrap_or_default())?,
            }
        }
        "activate" => {
            let table = args.opt_value_from_str("--table")?;
            let match_id: MatchId = args.free_from_str().context("activate needs a MATCH_ID")?;
            Command::ActivateMatch { match_id, table }
        }
        "auto-assign" => Command::AutoAssignTables,
        "advance" => Command::AdvanceGroupToKnockout,
        "next-round" => Command::GenerateNextSwissRound,
        "reset" => Command::Reset,
        _ => return Ok(None),
    };
    Ok(Some(command))
}

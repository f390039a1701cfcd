//! Aggregation of per-game-type outcome counts
//!
//! SLDB reports `[losses, wins, undecided]` for each concrete game type. The
//! client reshapes them into one mapping per outcome and adds the `Global`
//! total, which the server never sends.

use crate::error::{Result, SldbError};
use crate::types::{GameType, OutcomeCounts, PlayerStats};
use std::collections::BTreeMap;

/// Position of each outcome in a wire triple
const LOSSES_INDEX: usize = 0;
const WINS_INDEX: usize = 1;
const UNDECIDED_INDEX: usize = 2;

impl OutcomeCounts {
    /// Decode a positional `[losses, wins, undecided]` triple
    pub fn from_triple(triple: &[u64]) -> Option<Self> {
        if triple.len() != 3 {
            return None;
        }
        Some(Self {
            losses: triple[LOSSES_INDEX],
            wins: triple[WINS_INDEX],
            undecided: triple[UNDECIDED_INDEX],
        })
    }
}

/// Reshape per-type counts into outcome mappings with a computed Global
///
/// All four concrete game types must be present; a missing type is an error
/// rather than a silent zero.
pub fn aggregate(per_type: &BTreeMap<GameType, OutcomeCounts>) -> Result<PlayerStats> {
    let missing: Vec<GameType> = GameType::CONCRETE
        .into_iter()
        .filter(|t| !per_type.contains_key(t))
        .collect();
    if !missing.is_empty() {
        return Err(SldbError::IncompleteStats { missing });
    }

    let mut stats = PlayerStats::default();
    let mut global = OutcomeCounts::default();

    for game_type in GameType::CONCRETE {
        let counts = per_type[&game_type];

        stats.losses.insert(game_type, counts.losses);
        stats.wins.insert(game_type, counts.wins);
        stats.undecided.insert(game_type, counts.undecided);

        global.losses += counts.losses;
        global.wins += counts.wins;
        global.undecided += counts.undecided;
    }

    stats.losses.insert(GameType::Global, global.losses);
    stats.wins.insert(GameType::Global, global.wins);
    stats.undecided.insert(GameType::Global, global.undecided);

    Ok(stats)
}

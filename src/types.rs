//! Common types returned by the SLDB client

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Lobby account identifier
pub type AccountId = u64;

/// Match format tracked by SLDB
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameType {
    Duel,
    #[serde(rename = "FFA")]
    Ffa,
    Team,
    #[serde(rename = "TeamFFA")]
    TeamFfa,
    Global,
}

impl GameType {
    /// Game types the server reports raw data for, in wire order
    pub const CONCRETE: [GameType; 4] = [
        GameType::Duel,
        GameType::Ffa,
        GameType::Team,
        GameType::TeamFfa,
    ];

    /// Positional order of the bulk skills array
    pub const ALL: [GameType; 5] = [
        GameType::Duel,
        GameType::Ffa,
        GameType::Team,
        GameType::TeamFfa,
        GameType::Global,
    ];

    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Duel => "Duel",
            GameType::Ffa => "FFA",
            GameType::Team => "Team",
            GameType::TeamFfa => "TeamFFA",
            GameType::Global => "Global",
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown game type: {}", s))
    }
}

/// Skill rating as computed by SLDB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub estimated: f64,
    pub uncertainty: f64,
    /// Conservative estimate, `estimated - 3 * uncertainty` rounded to 2 places
    pub trusted: f64,
}

/// Ratings bracketing a single match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillChange {
    pub before: Rating,
    pub after: Rating,
}

/// Skills of one account, keyed by game type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSkills {
    pub account_id: AccountId,
    pub privacy_mode: i64,
    /// Sparse: types the server did not report are absent
    pub skills: BTreeMap<GameType, Rating>,
}

/// Skill change of one player within a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSkillChange {
    pub account_id: AccountId,
    pub privacy_mode: i64,
    pub skills: SkillChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub game_id: String,
    pub game_type: GameType,
    pub players: Vec<PlayerSkillChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPlayer {
    pub account_id: AccountId,
    pub name: String,
    pub estimated_skill: f64,
    pub uncertainty: f64,
    pub trusted_skill: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResult {
    pub game_type: GameType,
    pub players: Vec<LeaderboardPlayer>,
}

/// Outcome counts of a single game type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub losses: u64,
    pub wins: u64,
    pub undecided: u64,
}

/// Win/loss/undecided totals per game type, including the Global sum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub wins: BTreeMap<GameType, u64>,
    pub losses: BTreeMap<GameType, u64>,
    pub undecided: BTreeMap<GameType, u64>,
}

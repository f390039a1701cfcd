//! SLDB client facade
//!
//! One async method per remote procedure. Each issues exactly one call through
//! the [`CallEnvelope`] and decodes the payload into typed values before
//! returning; no partial results are ever handed out.

use crate::config::{ClientConfig, Credentials};
use crate::error::{Result, SldbError};
use crate::rating::{aggregate, decode_bulk_skills, decode_skill_change};
use crate::rpc::{CallEnvelope, Transport, XmlRpcTransport};
use crate::types::*;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Remote procedure names
pub const GET_PREF: &str = "getPref";
pub const SET_PREF: &str = "setPref";
pub const GET_SKILLS: &str = "getSkills";
pub const GET_MATCH_SKILLS: &str = "getMatchSkills";
pub const GET_LEADERBOARDS: &str = "getLeaderboards";
pub const GET_PLAYER_STATS: &str = "getPlayerStats";
pub const GET_PLAYER_SKILL_GRAPHS: &str = "getPlayerSkillGraphs";

/// Typed client for the SLDB XML-RPC interface
///
/// Cloning is cheap; clones share the transport and credentials and may be
/// used concurrently.
#[derive(Clone)]
pub struct SldbClient {
    envelope: CallEnvelope,
}

impl SldbClient {
    /// Create a client talking XML-RPC to the configured endpoint
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = XmlRpcTransport::new(config)?;
        info!(
            "SLDB client targeting {} as {}",
            transport.url(),
            config.username
        );

        Ok(Self::with_transport(
            Arc::new(transport),
            &config.credentials(),
            config.verbose,
        ))
    }

    /// Create a client on top of an arbitrary transport
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        credentials: &Credentials,
        verbose: bool,
    ) -> Self {
        Self {
            envelope: CallEnvelope::new(transport, credentials, verbose),
        }
    }

    /// Read a lobby preference of an account
    pub async fn get_pref(&self, account_id: AccountId, pref_name: &str) -> Result<String> {
        let payload = self
            .envelope
            .invoke(GET_PREF, vec![json!(account_id), json!(pref_name)])
            .await?;

        match payload {
            Value::String(value) => Ok(value),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            // Unset preference: reply carries no result
            Value::Null => Ok(String::new()),
            Value::Object(map) if map.keys().all(|k| k == "status") => Ok(String::new()),
            other => Err(SldbError::malformed_reply(
                GET_PREF,
                format!("expected a string, got {}", other),
            )),
        }
    }

    /// Set a lobby preference; `None` resets it on the server
    pub async fn set_pref(
        &self,
        account_id: AccountId,
        pref_name: &str,
        value: Option<&str>,
    ) -> Result<()> {
        let mut args = vec![json!(account_id), json!(pref_name)];
        if let Some(value) = value {
            args.push(json!(value));
        }

        self.envelope.invoke(SET_PREF, args).await?;
        Ok(())
    }

    /// Fetch the skills of several accounts for a mod
    pub async fn get_skills(
        &self,
        mod_name: &str,
        account_ids: &[AccountId],
    ) -> Result<Vec<PlayerSkills>> {
        let payload = self
            .envelope
            .invoke(GET_SKILLS, vec![json!(mod_name), json!(account_ids)])
            .await?;

        let raw: Vec<RawPlayerSkills> = decode_payload(GET_SKILLS, payload)?;
        let snapshots = raw
            .into_iter()
            .map(|player| {
                Ok(PlayerSkills {
                    account_id: player.account_id,
                    privacy_mode: player.privacy_mode,
                    skills: decode_bulk_skills(player.skills.as_slice())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Decoded {} skill snapshots for {}", snapshots.len(), mod_name);
        Ok(snapshots)
    }

    /// Fetch the skill changes of every player in the given matches
    pub async fn get_match_skills(&self, match_ids: &[&str]) -> Result<Vec<MatchResult>> {
        let payload = self
            .envelope
            .invoke(GET_MATCH_SKILLS, vec![json!(match_ids)])
            .await?;

        let raw: Vec<RawMatchResult> = decode_payload(GET_MATCH_SKILLS, payload)?;
        raw.into_iter()
            .map(|game| {
                let players = game
                    .players
                    .into_iter()
                    .map(|player| {
                        Ok(PlayerSkillChange {
                            account_id: player.account_id,
                            privacy_mode: player.privacy_mode,
                            skills: decode_skill_change(player.skills.as_slice())?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(MatchResult {
                    game_id: game.game_id,
                    game_type: game.game_type,
                    players,
                })
            })
            .collect()
    }

    /// Fetch the leaderboards of a mod for the given game types
    pub async fn get_leaderboards(
        &self,
        mod_name: &str,
        game_types: &[GameType],
    ) -> Result<Vec<LeaderboardResult>> {
        let payload = self
            .envelope
            .invoke(GET_LEADERBOARDS, vec![json!(mod_name), json!(game_types)])
            .await?;

        let raw: Vec<RawLeaderboardResult> = decode_payload(GET_LEADERBOARDS, payload)?;
        Ok(raw
            .into_iter()
            .map(|board| LeaderboardResult {
                game_type: board.game_type,
                players: board
                    .players
                    .into_iter()
                    .map(|p| LeaderboardPlayer {
                        account_id: p.account_id,
                        name: p.name,
                        estimated_skill: p.estimated_skill,
                        uncertainty: p.uncertainty,
                        trusted_skill: p.trusted_skill,
                    })
                    .collect(),
            })
            .collect())
    }

    /// Fetch win/loss/undecided counts of an account, with Global totals
    pub async fn get_player_stats(
        &self,
        mod_name: &str,
        account_id: AccountId,
    ) -> Result<PlayerStats> {
        let payload = self
            .envelope
            .invoke(GET_PLAYER_STATS, vec![json!(mod_name), json!(account_id)])
            .await?;

        let entries = match payload {
            Value::Object(entries) => entries,
            other => {
                return Err(SldbError::malformed_reply(
                    GET_PLAYER_STATS,
                    format!("expected a struct keyed by game type, got {}", other),
                ))
            }
        };

        let mut per_type = BTreeMap::new();
        for (key, value) in entries {
            let Some(game_type) = GameType::CONCRETE.into_iter().find(|t| t.as_str() == key)
            else {
                debug!("Ignoring {} entry {:?}", GET_PLAYER_STATS, key);
                continue;
            };

            let triple: Vec<WireCount> = decode_payload(GET_PLAYER_STATS, value)?;
            let triple: Vec<u64> = triple.into_iter().map(|c| c.0).collect();
            let counts = OutcomeCounts::from_triple(&triple).ok_or_else(|| {
                SldbError::malformed_reply(
                    GET_PLAYER_STATS,
                    format!("{} has {} values, expected 3", key, triple.len()),
                )
            })?;
            per_type.insert(game_type, counts);
        }

        aggregate(&per_type)
    }

    /// Fetch the skill graphs of an account; the payload is passed through
    pub async fn get_player_skill_graphs(
        &self,
        mod_name: &str,
        account_id: AccountId,
    ) -> Result<Value> {
        self.envelope
            .invoke(
                GET_PLAYER_SKILL_GRAPHS,
                vec![json!(mod_name), json!(account_id)],
            )
            .await
    }
}

fn decode_payload<T: DeserializeOwned>(method: &str, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| SldbError::malformed_reply(method, e.to_string()))
}

/// Accept a value either as itself or as its string rendering
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Text(String),
    }

    match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(value) => Ok(value),
        Lenient::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid number {:?}: {}", text, e))),
    }
}

/// Like [`lenient`], but NaN and infinities are rejected
fn lenient_finite<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = lenient(deserializer)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(de::Error::custom(format!("non-finite number {}", value)))
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct WireCount(#[serde(deserialize_with = "lenient")] u64);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlayerSkills {
    #[serde(deserialize_with = "lenient")]
    account_id: AccountId,
    #[serde(deserialize_with = "lenient")]
    privacy_mode: i64,
    skills: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatchResult {
    game_id: String,
    game_type: GameType,
    players: Vec<RawPlayerSkillChange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlayerSkillChange {
    #[serde(deserialize_with = "lenient")]
    account_id: AccountId,
    #[serde(deserialize_with = "lenient")]
    privacy_mode: i64,
    skills: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLeaderboardResult {
    game_type: GameType,
    players: Vec<RawLeaderboardPlayer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLeaderboardPlayer {
    #[serde(deserialize_with = "lenient")]
    account_id: AccountId,
    name: String,
    #[serde(deserialize_with = "lenient_finite")]
    estimated_skill: f64,
    #[serde(deserialize_with = "lenient_finite")]
    uncertainty: f64,
    #[serde(deserialize_with = "lenient_finite")]
    trusted_skill: f64,
}

//! Codec for the compact `estimated|uncertainty` skill encoding
//!
//! SLDB transmits every skill as a string holding two floats separated by
//! `|`. Decoding derives the trusted skill, a conservative lower bound of
//! the true skill (see TrueSkill).

use crate::error::{Result, SldbError};
use crate::types::{GameType, Rating, SkillChange};
use crate::utils::round_to_places;
use std::collections::BTreeMap;

/// Separator between the estimate and the uncertainty
pub const SKILL_SEPARATOR: char = '|';

/// Number of standard deviations subtracted for the trusted skill
pub const TRUSTED_SIGMA_FACTOR: f64 = 3.0;

/// Build a rating from its two components, deriving the trusted skill
pub fn rating_from_parts(estimated: f64, uncertainty: f64) -> Rating {
    Rating {
        estimated,
        uncertainty,
        trusted: round_to_places(estimated - TRUSTED_SIGMA_FACTOR * uncertainty, 2),
    }
}

/// Decode a single `estimated|uncertainty` string
pub fn decode_skill(value: &str) -> Result<Rating> {
    let segments: Vec<&str> = value.split(SKILL_SEPARATOR).collect();
    if segments.len() != 2 {
        return Err(malformed(
            value,
            format!("expected 2 segments, found {}", segments.len()),
        ));
    }

    let estimated = parse_segment(value, segments[0])?;
    let uncertainty = parse_segment(value, segments[1])?;

    Ok(rating_from_parts(estimated, uncertainty))
}

/// Encode a rating back into its wire form
pub fn encode_skill(rating: &Rating) -> String {
    format!(
        "{}{}{}",
        rating.estimated, SKILL_SEPARATOR, rating.uncertainty
    )
}

/// Decode the bulk skills array of a player
///
/// Positions map to [`GameType::ALL`]. Entries past the last game type are
/// ignored and missing trailing entries leave the type absent.
pub fn decode_bulk_skills<S: AsRef<str>>(values: &[S]) -> Result<BTreeMap<GameType, Rating>> {
    GameType::ALL
        .iter()
        .zip(values)
        .map(|(game_type, value)| Ok((*game_type, decode_skill(value.as_ref())?)))
        .collect()
}

/// Decode the `[before, after]` pair attached to a match participant
pub fn decode_skill_change<S: AsRef<str>>(values: &[S]) -> Result<SkillChange> {
    match values {
        [before, after] => Ok(SkillChange {
            before: decode_skill(before.as_ref())?,
            after: decode_skill(after.as_ref())?,
        }),
        _ => Err(malformed(
            &values
                .iter()
                .map(|v| v.as_ref())
                .collect::<Vec<_>>()
                .join(","),
            format!("expected a before/after pair, found {} entries", values.len()),
        )),
    }
}

fn parse_segment(value: &str, segment: &str) -> Result<f64> {
    let number: f64 = segment
        .trim()
        .parse()
        .map_err(|_| malformed(value, format!("{:?} is not a number", segment)))?;

    if !number.is_finite() {
        return Err(malformed(value, format!("{:?} is not finite", segment)));
    }

    Ok(number)
}

fn malformed(value: &str, reason: String) -> SldbError {
    SldbError::MalformedSkill {
        value: value.to_string(),
        reason,
    }
}

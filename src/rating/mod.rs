//! Skill value normalization
//!
//! This module decodes the compact skill strings SLDB sends and reshapes
//! per-game-type outcome counts into aggregate player stats.

pub mod codec;
pub mod stats;

// Re-export commonly used functions
pub use codec::{
    decode_bulk_skills, decode_skill, decode_skill_change, encode_skill, rating_from_parts,
};
pub use stats::aggregate;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DifficultyError {
    #[error("unknown difficulty: {0:?}")]
    UnknownDifficulty(String),
    #[error("unknown difficulty band: {0:?}")]
    UnknownBand(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty tag carried by every phrase and grammar exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(DifficultyError::UnknownDifficulty(other.to_owned())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── BAND ──────────────────────────────────────────────────────────────────────
//

/// Named difficulty filter.
///
/// `None` where an `Option<DifficultyBand>` is expected means unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DifficultyBand {
    Easy,
    EasyMedium,
    Medium,
    Hard,
}

impl DifficultyBand {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyBand::Easy => "easy",
            DifficultyBand::EasyMedium => "easy-medium",
            DifficultyBand::Medium => "medium",
            DifficultyBand::Hard => "hard",
        }
    }

    /// Whether a phrase of `difficulty` passes a user's difficulty preference.
    #[must_use]
    pub fn admits_phrase(self, difficulty: Difficulty) -> bool {
        match self {
            DifficultyBand::Easy => difficulty == Difficulty::Easy,
            DifficultyBand::EasyMedium => {
                matches!(difficulty, Difficulty::Easy | Difficulty::Medium)
            }
            DifficultyBand::Medium => difficulty == Difficulty::Medium,
            DifficultyBand::Hard => difficulty == Difficulty::Hard,
        }
    }

    /// Whether a grammar exercise of `difficulty` fits a level-derived band.
    ///
    /// Unlike phrases, the hard band also keeps medium grammar exercises.
    #[must_use]
    pub fn admits_grammar(self, difficulty: Difficulty) -> bool {
        match self {
            DifficultyBand::Hard => {
                matches!(difficulty, Difficulty::Medium | Difficulty::Hard)
            }
            other => other.admits_phrase(difficulty),
        }
    }
}

impl FromStr for DifficultyBand {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "easy" => Ok(Self::Easy),
            "easy-medium" => Ok(Self::EasyMedium),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(DifficultyError::UnknownBand(other.to_owned())),
        }
    }
}

impl fmt::Display for DifficultyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// Anything tagged with a difficulty.
pub trait Graded {
    fn difficulty(&self) -> Difficulty;
}

/// Maps a user level to the band used for daily grammar selection.
///
/// Levels above 20 are unrestricted (`None`).
#[must_use]
pub fn band_for_level(level: u32) -> Option<DifficultyBand> {
    match level {
        0..=5 => Some(DifficultyBand::Easy),
        6..=10 => Some(DifficultyBand::EasyMedium),
        11..=15 => Some(DifficultyBand::Medium),
        16..=20 => Some(DifficultyBand::Hard),
        _ => None,
    }
}

/// Keeps the items admitted by a user's difficulty preference.
#[must_use]
pub fn filter_by_difficulty<T: Graded>(items: Vec<T>, preference: Option<DifficultyBand>) -> Vec<T> {
    match preference {
        None => items,
        Some(band) => items
            .into_iter()
            .filter(|item| band.admits_phrase(item.difficulty()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Graded for Difficulty {
        fn difficulty(&self) -> Difficulty {
            *self
        }
    }

    fn all() -> Vec<Difficulty> {
        vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }

    #[test]
    fn band_scenarios() {
        assert_eq!(band_for_level(3), Some(DifficultyBand::Easy));
        assert_eq!(band_for_level(8), Some(DifficultyBand::EasyMedium));
        assert_eq!(band_for_level(13), Some(DifficultyBand::Medium));
        assert_eq!(band_for_level(18), Some(DifficultyBand::Hard));
        assert_eq!(band_for_level(25), None);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(band_for_level(0), Some(DifficultyBand::Easy));
        assert_eq!(band_for_level(5), Some(DifficultyBand::Easy));
        assert_eq!(band_for_level(6), Some(DifficultyBand::EasyMedium));
        assert_eq!(band_for_level(10), Some(DifficultyBand::EasyMedium));
        assert_eq!(band_for_level(11), Some(DifficultyBand::Medium));
        assert_eq!(band_for_level(15), Some(DifficultyBand::Medium));
        assert_eq!(band_for_level(16), Some(DifficultyBand::Hard));
        assert_eq!(band_for_level(20), Some(DifficultyBand::Hard));
        assert_eq!(band_for_level(21), None);
        assert_eq!(band_for_level(u32::MAX), None);
    }

    #[test]
    fn band_progression_is_monotonic() {
        fn rank(band: Option<DifficultyBand>) -> u8 {
            match band {
                Some(DifficultyBand::Easy) => 0,
                Some(DifficultyBand::EasyMedium) => 1,
                Some(DifficultyBand::Medium) => 2,
                Some(DifficultyBand::Hard) => 3,
                None => 4,
            }
        }
        let mut previous = rank(band_for_level(0));
        for level in 1..=40 {
            let current = rank(band_for_level(level));
            assert!(current >= previous, "level {level} went backwards");
            previous = current;
        }
    }

    #[test]
    fn preference_filter_matches_bands() {
        assert_eq!(filter_by_difficulty(all(), None), all());
        assert_eq!(
            filter_by_difficulty(all(), Some(DifficultyBand::Easy)),
            vec![Difficulty::Easy]
        );
        assert_eq!(
            filter_by_difficulty(all(), Some(DifficultyBand::EasyMedium)),
            vec![Difficulty::Easy, Difficulty::Medium]
        );
        assert_eq!(
            filter_by_difficulty(all(), Some(DifficultyBand::Medium)),
            vec![Difficulty::Medium]
        );
        assert_eq!(
            filter_by_difficulty(all(), Some(DifficultyBand::Hard)),
            vec![Difficulty::Hard]
        );
    }

    #[test]
    fn hard_grammar_band_includes_medium() {
        assert!(DifficultyBand::Hard.admits_grammar(Difficulty::Medium));
        assert!(DifficultyBand::Hard.admits_grammar(Difficulty::Hard));
        assert!(!DifficultyBand::Hard.admits_grammar(Difficulty::Easy));
        assert!(!DifficultyBand::Hard.admits_phrase(Difficulty::Medium));
    }

    #[test]
    fn band_serde_uses_kebab_case() {
        let json = serde_json::to_string(&DifficultyBand::EasyMedium).unwrap();
        assert_eq!(json, "\"easy-medium\"");
        let parsed: DifficultyBand = "easy-medium".parse().unwrap();
        assert_eq!(parsed, DifficultyBand::EasyMedium);
        assert!("extreme".parse::<DifficultyBand>().is_err());
    }
}

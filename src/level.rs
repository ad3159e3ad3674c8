//! Difficulty levels of the challenge.
//!
//! Each level selects a different set of hint and guess rules (see [`crate::rules`]).

use std::{fmt, str::FromStr};

use anyhow::bail;

/// A difficulty tier, from 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Hint must avoid the taboo words and the target word.
    One = 1,
    /// Like level 1, the target's translation is forbidden too and must be guessed.
    Two = 2,
    /// Hint must be picked verbatim from the admissible hints list.
    Three = 3,
    /// Like level 1, with at most 5 words of at most 20 characters.
    Four = 4,
}

impl Level {
    /// Every level, in ascending order.
    pub const ALL: [Level; 4] = [Level::One, Level::Two, Level::Three, Level::Four];

    /// The level as a plain number.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Score multiplier for a correct answer at this level (`sqrt(level)`).
    pub fn weight(self) -> f64 {
        f64::from(self.number()).sqrt()
    }
}

impl TryFrom<u8> for Level {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> anyhow::Result<Self> {
        match value {
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            3 => Ok(Level::Three),
            4 => Ok(Level::Four),
            _ => bail!("unknown level {value}, expected 1, 2, 3 or 4"),
        }
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let Ok(n) = s.trim().parse::<u8>() else {
            bail!("'{s}' is not a level number");
        };
        Level::try_from(n)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_levels() {
        assert_eq!("3".parse::<Level>().unwrap(), Level::Three);
        assert_eq!(Level::try_from(1).unwrap(), Level::One);
        assert!("5".parse::<Level>().is_err());
        assert!("zero".parse::<Level>().is_err());
        assert!(Level::try_from(0).is_err());
    }

    #[test]
    fn weight_is_square_root() {
        assert_eq!(Level::One.weight(), 1.0);
        assert_eq!(Level::Four.weight(), 2.0);
        assert!((Level::Three.weight() - 3f64.sqrt()).abs() < f64::EPSILON);
    }
}

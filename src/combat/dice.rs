//! Dice notation and rolling
//!
//! Understands "NdS", "NdS+M" and "NdS-M" (e.g. "2d6+3", "d20", "4d8-1").
//! Callers that need reproducible results pass their own RNG.

use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;

/// Sides on the initiative die
pub const D20: u32 = 20;

/// Largest dice count accepted from text
pub const MAX_DICE: u32 = 1000;

/// Largest die size accepted from text
pub const MAX_SIDES: u32 = 1000;

/// A parsed dice expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceRoll {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceRoll {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Roll with the thread-local RNG
    pub fn roll(&self) -> i32 {
        self.roll_with(&mut rand::rng())
    }

    /// Roll with a caller-supplied RNG
    pub fn roll_with<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.sides == 0 {
            return self.min();
        }
        let sum = (0..self.count).fold(0i64, |acc, _| {
            acc.saturating_add(i64::from(rng.random_range(1..=self.sides)))
        });
        saturate(sum.saturating_add(i64::from(self.modifier)))
    }

    pub fn min(&self) -> i32 {
        saturate(i64::from(self.count) + i64::from(self.modifier))
    }

    pub fn max(&self) -> i32 {
        let faces = i64::from(self.count).saturating_mul(i64::from(self.sides));
        saturate(faces.saturating_add(i64::from(self.modifier)))
    }
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

impl FromStr for DiceRoll {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        let (count_part, rest) = text
            .split_once('d')
            .ok_or_else(|| TrackerError::invalid(format!("not dice notation: {s}")))?;

        let count = if count_part.is_empty() {
            1
        } else {
            count_part
                .parse::<u32>()
                .map_err(|_| TrackerError::invalid(format!("bad dice count: {count_part}")))?
        };

        let (sides_part, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (sides_part, modifier_part) = rest.split_at(pos);
                let modifier = modifier_part
                    .trim_start_matches('+')
                    .parse::<i32>()
                    .map_err(|_| {
                        TrackerError::invalid(format!("bad dice modifier: {modifier_part}"))
                    })?;
                (sides_part, modifier)
            }
            None => (rest, 0),
        };

        let sides = sides_part
            .parse::<u32>()
            .map_err(|_| TrackerError::invalid(format!("bad die size: {sides_part}")))?;

        if count == 0 || sides == 0 {
            return Err(TrackerError::invalid(format!(
                "dice count and sides must be at least 1: {s}"
            )));
        }
        if count > MAX_DICE || sides > MAX_SIDES {
            return Err(TrackerError::invalid(format!(
                "at most {MAX_DICE} dice of at most {MAX_SIDES} sides: {s}"
            )));
        }

        Ok(DiceRoll::new(count, sides, modifier))
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.count, self.sides),
            m if m > 0 => write!(f, "{}d{}+{}", self.count, self.sides, m),
            m => write!(f, "{}d{}{}", self.count, self.sides, m),
        }
    }
}

/// Roll a single d20
pub fn roll_d20_with<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    saturate(i64::from(rng.random_range(1..=D20)))
}

/// Resolve a damage/heal amount given either as a plain integer or as dice
pub fn resolve_amount(input: &str) -> Result<i32, TrackerError> {
    let input = input.trim();
    if let Ok(value) = input.parse::<i32>() {
        return Ok(value);
    }
    let dice: DiceRoll = input.parse()?;
    Ok(dice.roll().max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_forms() {
        assert_eq!("2d6".parse::<DiceRoll>().unwrap(), DiceRoll::new(2, 6, 0));
        assert_eq!("1d20+5".parse::<DiceRoll>().unwrap(), DiceRoll::new(1, 20, 5));
        assert_eq!("3d8-2".parse::<DiceRoll>().unwrap(), DiceRoll::new(3, 8, -2));
        assert_eq!(" D12 ".parse::<DiceRoll>().unwrap(), DiceRoll::new(1, 12, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "abc", "2d", "d", "0d6", "2d0", "2d6+x", "-1d6"] {
            let err = bad.parse::<DiceRoll>().unwrap_err();
            assert!(
                matches!(err, TrackerError::InvalidArgument(_)),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_oversized() {
        for bad in ["4294967295d1", "1001d6", "1d1001", "1d4000000000", "70000d70000"] {
            let err = bad.parse::<DiceRoll>().unwrap_err();
            assert!(
                matches!(err, TrackerError::InvalidArgument(_)),
                "{bad:?} gave {err:?}"
            );
        }
        assert!(resolve_amount("30000000d200").is_err());

        let largest = format!("{MAX_DICE}d{MAX_SIDES}+5").parse::<DiceRoll>().unwrap();
        assert_eq!(largest.max(), 1_000_005);
        let mut rng = StdRng::seed_from_u64(3);
        let total = largest.roll_with(&mut rng);
        assert!((largest.min()..=largest.max()).contains(&total));
    }

    #[test]
    fn test_extreme_values_saturate() {
        let dice = DiceRoll::new(u32::MAX, u32::MAX, i32::MAX);
        assert_eq!(dice.max(), i32::MAX);
        assert_eq!(dice.min(), i32::MAX);
        assert_eq!(DiceRoll::new(1, 6, i32::MIN).min(), i32::MIN + 1);

        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(DiceRoll::new(2, u32::MAX, i32::MAX).roll_with(&mut rng), i32::MAX);
    }

    #[test]
    fn test_roll_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let dice = DiceRoll::new(3, 6, 2);
        for _ in 0..200 {
            let total = dice.roll_with(&mut rng);
            assert!((dice.min()..=dice.max()).contains(&total));
        }
    }

    #[test]
    fn test_d20_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            assert!((1..=20).contains(&roll_d20_with(&mut rng)));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(DiceRoll::new(2, 6, 0).to_string(), "2d6");
        assert_eq!(DiceRoll::new(1, 20, 5).to_string(), "1d20+5");
        assert_eq!(DiceRoll::new(3, 8, -2).to_string(), "3d8-2");
    }

    #[test]
    fn test_resolve_amount() {
        assert_eq!(resolve_amount("12").unwrap(), 12);
        assert_eq!(resolve_amount("-3").unwrap(), -3);
        let rolled = resolve_amount("2d4+1").unwrap();
        assert!((3..=9).contains(&rolled));
        assert!(resolve_amount("lots").is_err());
    }
}

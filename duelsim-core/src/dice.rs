//! Dice rolling and expression evaluation.
//!
//! Supports additive dice notation (`2d6`, `1d8+5`, `3d8+2d6+3`),
//! d20 rolls with advantage/disadvantage, per-die minimums (2024 Great
//! Weapon Fighting) and roll-twice-keep-best (Savage Attacker).
//!
//! Every rolling function is generic over [`rand::Rng`] so a whole combat
//! can be driven from one seeded stream and replayed exactly.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice notation parsing.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Advantage state for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl Advantage {
    /// Build an advantage state from boolean flags; both set cancel out.
    pub fn from_flags(advantage: bool, disadvantage: bool) -> Advantage {
        match (advantage, disadvantage) {
            (true, false) => Advantage::Advantage,
            (false, true) => Advantage::Disadvantage,
            _ => Advantage::Normal,
        }
    }
}

/// Roll a d20 with advantage/disadvantage. Result is in `1..=20`.
pub fn d20<R: Rng>(rng: &mut R, advantage: Advantage) -> u32 {
    match advantage {
        Advantage::Normal => rng.gen_range(1..=20),
        Advantage::Advantage => {
            let (a, b) = (rng.gen_range(1..=20), rng.gen_range(1..=20));
            a.max(b)
        }
        Advantage::Disadvantage => {
            let (a, b) = (rng.gen_range(1..=20), rng.gen_range(1..=20));
            a.min(b)
        }
    }
}

/// One `XdY` group of a dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceGroup {
    pub count: u32,
    pub sides: u32,
}

impl DiceGroup {
    /// Roll the group. Any die below `minimum` is raised to it.
    fn roll_into<R: Rng>(&self, rng: &mut R, minimum: Option<u32>, out: &mut Vec<u32>) {
        let floor = minimum.unwrap_or(1);
        for _ in 0..self.count {
            let r = rng.gen_range(1..=self.sides);
            out.push(r.max(floor));
        }
    }
}

/// A parsed dice expression: a sum of dice groups plus a flat modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpression {
    pub groups: Vec<DiceGroup>,
    pub modifier: i32,
    original: String,
}

impl DiceExpression {
    /// Parse a dice notation string like `2d6+3` or `1d8+1d6-1`.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut groups = Vec::new();
        let mut modifier: i32 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;

        for ch in notation.chars() {
            match ch {
                '+' | '-' => {
                    if !current.is_empty() {
                        Self::parse_term(&current, sign, &mut groups, &mut modifier)?;
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            Self::parse_term(&current, sign, &mut groups, &mut modifier)?;
        }

        if groups.is_empty() && modifier == 0 {
            return Err(DiceError::NoDice);
        }

        Ok(DiceExpression {
            groups,
            modifier,
            original: notation,
        })
    }

    fn parse_term(
        s: &str,
        sign: i32,
        groups: &mut Vec<DiceGroup>,
        modifier: &mut i32,
    ) -> Result<(), DiceError> {
        if let Some(d_pos) = s.find('d') {
            let count: u32 = if s[..d_pos].is_empty() {
                1
            } else {
                s[..d_pos]
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
            };
            let sides: u32 = s[d_pos + 1..]
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            if sides == 0 {
                return Err(DiceError::InvalidDieSize(sides));
            }
            // Negative dice groups are not supported; subtraction is flat-only.
            if sign < 0 {
                return Err(DiceError::InvalidNotation(s.to_string()));
            }
            groups.push(DiceGroup { count, sides });
        } else {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            *modifier += sign * value;
        }
        Ok(())
    }

    /// Roll the expression. If `minimum` is given, every individual die
    /// below that value is raised to it (GWF: 1s and 2s become 3s).
    pub fn roll<R: Rng>(&self, rng: &mut R, minimum: Option<u32>) -> DiceResult {
        let mut rolls = Vec::new();
        for group in &self.groups {
            group.roll_into(rng, minimum, &mut rolls);
        }
        let dice_total: i32 = rolls.iter().map(|&r| r as i32).sum();
        DiceResult {
            total: dice_total + self.modifier,
            rolls,
            modifier: self.modifier,
        }
    }

    /// Roll the dice portion twice and keep the set with the higher sum.
    /// The flat modifier is added once (Savage Attacker: "roll the weapon's
    /// damage dice twice and use either roll").
    pub fn roll_twice_keep_best<R: Rng>(&self, rng: &mut R, minimum: Option<u32>) -> DiceResult {
        let first = self.roll_dice_only(rng, minimum);
        let second = self.roll_dice_only(rng, minimum);
        let best = if first.iter().sum::<u32>() >= second.iter().sum::<u32>() {
            first
        } else {
            second
        };
        let dice_total: i32 = best.iter().map(|&r| r as i32).sum();
        DiceResult {
            total: dice_total + self.modifier,
            rolls: best,
            modifier: self.modifier,
        }
    }

    fn roll_dice_only<R: Rng>(&self, rng: &mut R, minimum: Option<u32>) -> Vec<u32> {
        let mut rolls = Vec::new();
        for group in &self.groups {
            group.roll_into(rng, minimum, &mut rolls);
        }
        rolls
    }

    /// Expected value of the expression (used to pick the "best" weapon).
    pub fn average(&self) -> f64 {
        let dice: f64 = self
            .groups
            .iter()
            .map(|g| g.count as f64 * (g.sides as f64 + 1.0) / 2.0)
            .sum();
        dice + self.modifier as f64
    }

    /// Lowest possible total.
    pub fn minimum_total(&self) -> i32 {
        let dice: i32 = self.groups.iter().map(|g| g.count as i32).sum();
        dice + self.modifier
    }

    /// Highest possible total.
    pub fn maximum_total(&self) -> i32 {
        let dice: i32 = self
            .groups
            .iter()
            .map(|g| (g.count * g.sides) as i32)
            .sum();
        dice + self.modifier
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl TryFrom<String> for DiceExpression {
    type Error = DiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DiceExpression::parse(&s)
    }
}

impl From<DiceExpression> for String {
    fn from(expr: DiceExpression) -> String {
        expr.original
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Result of evaluating a dice expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceResult {
    pub total: i32,
    pub rolls: Vec<u32>,
    pub modifier: i32,
}

/// Convenience: parse and roll in one step with a caller-supplied RNG.
pub fn eval_dice<R: Rng>(notation: &str, rng: &mut R) -> Result<DiceResult, DiceError> {
    let expr = DiceExpression::parse(notation)?;
    Ok(expr.roll(rng, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn parse_simple() {
        let expr = DiceExpression::parse("2d6").unwrap();
        assert_eq!(expr.groups, vec![DiceGroup { count: 2, sides: 6 }]);
        assert_eq!(expr.modifier, 0);
    }

    #[test]
    fn parse_with_modifier() {
        let expr = DiceExpression::parse("1d8+5").unwrap();
        assert_eq!(expr.modifier, 5);
        let expr = DiceExpression::parse("2d6-2").unwrap();
        assert_eq!(expr.modifier, -2);
    }

    #[test]
    fn parse_multiple_groups() {
        let expr = DiceExpression::parse("3d8+2d6+3").unwrap();
        assert_eq!(expr.groups.len(), 2);
        assert_eq!(expr.modifier, 3);
    }

    #[test]
    fn parse_flat_only() {
        let expr = DiceExpression::parse("1").unwrap();
        assert!(expr.groups.is_empty());
        assert_eq!(expr.modifier, 1);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(DiceExpression::parse("").is_err());
        assert!(DiceExpression::parse("2dx").is_err());
        assert!(DiceExpression::parse("1d0").is_err());
    }

    #[test]
    fn roll_stays_in_range() {
        let expr = DiceExpression::parse("2d6+3").unwrap();
        let mut r = rng(1);
        for _ in 0..500 {
            let result = expr.roll(&mut r, None);
            assert!(result.total >= 5 && result.total <= 15);
            assert_eq!(result.rolls.len(), 2);
        }
    }

    #[test]
    fn d20_advantage_raises_average() {
        let mut r = rng(42);
        let n = 10_000;
        let sum: u32 = (0..n).map(|_| d20(&mut r, Advantage::Advantage)).sum();
        let avg = sum as f64 / n as f64;
        // Expected value with advantage is ~13.8.
        assert!(avg > 12.5, "advantage average too low: {avg}");
    }

    #[test]
    fn d20_disadvantage_lowers_average() {
        let mut r = rng(42);
        let n = 10_000;
        let sum: u32 = (0..n).map(|_| d20(&mut r, Advantage::Disadvantage)).sum();
        let avg = sum as f64 / n as f64;
        // Expected value with disadvantage is ~7.2.
        assert!(avg < 8.5, "disadvantage average too high: {avg}");
    }

    #[test]
    fn advantage_and_disadvantage_cancel() {
        assert_eq!(Advantage::from_flags(true, true), Advantage::Normal);

        let mut r = rng(7);
        let n = 20_000;
        let mut counts = [0u32; 21];
        let mut sum = 0u32;
        for _ in 0..n {
            let roll = d20(&mut r, Advantage::from_flags(true, true));
            counts[roll as usize] += 1;
            sum += roll;
        }
        let avg = sum as f64 / n as f64;
        assert!((9.5..=11.5).contains(&avg), "cancelled average off: {avg}");
        // Every face should land near the uniform 5%.
        for face in 1..=20 {
            let pct = counts[face] as f64 / n as f64;
            assert!(
                (0.03..=0.07).contains(&pct),
                "face {face} frequency {pct} not ~5%"
            );
        }
    }

    #[test]
    fn minimum_floors_every_die() {
        let expr = DiceExpression::parse("2d6").unwrap();
        let mut r = rng(3);
        let mut sum = 0i64;
        let n = 5_000;
        for _ in 0..n {
            let result = expr.roll(&mut r, Some(3));
            assert!(result.rolls.iter().all(|&d| d >= 3));
            sum += result.total as i64;
        }
        // Per-die average with a floor of 3 is 3.83 vs 3.5 unmodified.
        let avg = sum as f64 / n as f64;
        assert!(avg > 7.0, "GWF average {avg} should beat plain 2d6");
    }

    #[test]
    fn twice_take_best_at_least_as_good() {
        let expr = DiceExpression::parse("2d6").unwrap();
        let n = 5_000;

        let mut r = rng(11);
        let plain: i64 = (0..n).map(|_| expr.roll(&mut r, None).total as i64).sum();
        let mut r = rng(11);
        let best: i64 = (0..n)
            .map(|_| expr.roll_twice_keep_best(&mut r, None).total as i64)
            .sum();
        assert!(best >= plain, "twice-take-best {best} < plain {plain}");
    }

    #[test]
    fn twice_take_best_adds_modifier_once() {
        // 1d1 always rolls 1, so the total is exactly 1 + 5 regardless of
        // how many times the dice portion is rolled.
        let expr = DiceExpression::parse("1d1+5").unwrap();
        let mut r = rng(1);
        let result = expr.roll_twice_keep_best(&mut r, None);
        assert_eq!(result.total, 6);
    }

    #[test]
    fn average_and_bounds() {
        let expr = DiceExpression::parse("2d6+3").unwrap();
        assert_eq!(expr.average(), 10.0);
        assert_eq!(expr.minimum_total(), 5);
        assert_eq!(expr.maximum_total(), 15);
    }

    #[test]
    fn serde_round_trip() {
        let expr = DiceExpression::parse("2d6+3").unwrap();
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, "\"2d6+3\"");
        let back: DiceExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}

//! Signal translation: indicator outputs to per-bar position states.
//!
//! # Evaluation Semantics
//!
//! - Rules are evaluated index-wise and never look past the given bar
//! - Any undefined operand makes the rule undefined (`None`); `And`, `Or`
//!   and `Not` propagate undefined children instead of short-circuiting
//! - Long and short both true: `Flat`
//! - Either side undefined: position undefined

use std::fmt;

/// Directional exposure held over a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Short,
    Flat,
    Long,
}

impl Position {
    /// -1, 0 or +1.
    pub fn direction(self) -> f64 {
        match self {
            Position::Short => -1.0,
            Position::Flat => 0.0,
            Position::Long => 1.0,
        }
    }

    pub fn trend(self) -> Option<Trend> {
        match self {
            Position::Long => Some(Trend::Bullish),
            Position::Short => Some(Trend::Bearish),
            Position::Flat => None,
        }
    }
}

impl From<Trend> for Position {
    fn from(trend: Trend) -> Self {
        match trend {
            Trend::Bullish => Position::Long,
            Trend::Bearish => Position::Short,
        }
    }
}

/// Direction reported for the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => f.write_str("bullish"),
            Trend::Bearish => f.write_str("bearish"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand<'a> {
    Series(&'a [Option<f64>]),
    Prices(&'a [f64]),
    Constant(f64),
}

impl Operand<'_> {
    fn at(&self, index: usize) -> Option<f64> {
        match self {
            Operand::Series(s) => s.get(index).copied().flatten(),
            Operand::Prices(p) => p.get(index).copied(),
            Operand::Constant(c) => Some(*c),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule<'a> {
    Above {
        left: Operand<'a>,
        right: Operand<'a>,
    },
    Below {
        left: Operand<'a>,
        right: Operand<'a>,
    },
    And(Vec<Rule<'a>>),
    Or(Vec<Rule<'a>>),
    Not(Box<Rule<'a>>),
    /// A precomputed per-bar condition.
    Flag(&'a [Option<bool>]),
}

impl Rule<'_> {
    pub fn evaluate(&self, index: usize) -> Option<bool> {
        match self {
            Rule::Above { left, right } => Some(left.at(index)? > right.at(index)?),
            Rule::Below { left, right } => Some(left.at(index)? < right.at(index)?),
            Rule::And(rules) => rules
                .iter()
                .map(|r| r.evaluate(index))
                .try_fold(true, |acc, v| Some(acc & v?)),
            Rule::Or(rules) => rules
                .iter()
                .map(|r| r.evaluate(index))
                .try_fold(false, |acc, v| Some(acc | v?)),
            Rule::Not(rule) => rule.evaluate(index).map(|v| !v),
            Rule::Flag(flags) => flags.get(index).copied().flatten(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRules<'a> {
    pub long: Rule<'a>,
    pub short: Rule<'a>,
}

pub fn position_at(rules: &SignalRules<'_>, index: usize) -> Option<Position> {
    let long = rules.long.evaluate(index)?;
    let short = rules.short.evaluate(index)?;
    Some(match (long, short) {
        (true, false) => Position::Long,
        (false, true) => Position::Short,
        _ => Position::Flat,
    })
}

pub fn translate(rules: &SignalRules<'_>, len: usize) -> Vec<Option<Position>> {
    (0..len).map(|i| position_at(rules, i)).collect()
}

/// Hold the last non-flat state until the opposite signal.
///
/// `Flat` becomes the previous non-flat position (a leading `Flat` stays
/// `Flat`); undefined bars stay undefined without clearing the held state.
pub fn carry_forward(positions: &[Option<Position>]) -> Vec<Option<Position>> {
    let mut held: Option<Position> = None;
    positions
        .iter()
        .map(|p| {
            let p = (*p)?;
            if p != Position::Flat {
                held = Some(p);
            }
            Some(held.unwrap_or(Position::Flat))
        })
        .collect()
}

/// Trend implied by the position at the final bar.
pub fn latest_trend(positions: &[Option<Position>]) -> Option<Trend> {
    positions.last().copied().flatten().and_then(Position::trend)
}

/// Positions as -1 / 0 / +1.
pub fn position_codes(positions: &[Option<Position>]) -> Vec<Option<f64>> {
    positions.iter().map(|p| p.map(Position::direction)).collect()
}

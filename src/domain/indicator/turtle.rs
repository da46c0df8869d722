//! Turtle trading channels.
//!
//! Entry channel: rolling max(high) / min(low) over `entry` bars.
//! Exit channel:  rolling max(high) / min(low) over `exit` bars.
//!
//! A breakout happens when the high reaches the previous bar's entry high
//! (or the low reaches the previous entry low). `BreakoutCounters` tracks
//! bars since the last breakout on each side; an undefined channel never
//! counts as a breakout. The trend line K1 follows the entry low while the
//! most recent breakout was upward (or both are equally recent) and the
//! entry high otherwise; K2 does the same with the exit channel.

use crate::domain::error::StratlabError;
use crate::domain::indicator::rolling::{rolling_max, rolling_min};
use crate::domain::indicator_helpers::{Series, check_window, defined, shift};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_ENTRY: usize = 20;
pub const DEFAULT_EXIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakoutCounters {
    pub since_high: usize,
    pub since_low: usize,
}

impl BreakoutCounters {
    fn step(&mut self, high_break: bool, low_break: bool) {
        self.since_high = if high_break { 0 } else { self.since_high + 1 };
        self.since_low = if low_break { 0 } else { self.since_low + 1 };
    }

    /// The latest breakout was upward, or both sides broke together.
    pub fn long_bias(&self) -> bool {
        self.since_high <= self.since_low
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurtleOutput {
    pub entry_high: Series,
    pub entry_low: Series,
    pub exit_high: Series,
    pub exit_low: Series,
    pub counters: Vec<BreakoutCounters>,
    pub k1: Series,
    pub k2: Series,
}

pub fn turtle_channels(
    series: &PriceSeries,
    entry: usize,
    exit: usize,
) -> Result<TurtleOutput, StratlabError> {
    check_window("turtle entry", entry, series.len())?;
    check_window("turtle exit", exit, series.len())?;

    let highs = defined(&series.highs());
    let lows = defined(&series.lows());
    let entry_high = rolling_max(&highs, entry)?;
    let entry_low = rolling_min(&lows, entry)?;
    let exit_high = rolling_max(&highs, exit)?;
    let exit_low = rolling_min(&lows, exit)?;

    let prev_entry_high = shift(&entry_high, 1);
    let prev_entry_low = shift(&entry_low, 1);

    let mut state = BreakoutCounters::default();
    let mut counters = Vec::with_capacity(series.len());
    let mut k1 = Vec::with_capacity(series.len());
    let mut k2 = Vec::with_capacity(series.len());

    for (i, bar) in series.bars().iter().enumerate() {
        let high_break = prev_entry_high[i].is_some_and(|h| bar.high >= h);
        let low_break = prev_entry_low[i].is_some_and(|l| bar.low <= l);
        state.step(high_break, low_break);
        counters.push(state);

        if state.long_bias() {
            k1.push(entry_low[i]);
            k2.push(exit_low[i]);
        } else {
            k1.push(entry_high[i]);
            k2.push(exit_high[i]);
        }
    }

    Ok(TurtleOutput {
        entry_high,
        entry_low,
        exit_high,
        exit_low,
        counters,
        k1,
        k2,
    })
}

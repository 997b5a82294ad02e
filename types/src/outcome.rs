//! Ballots and outcome fractions.
//!
//! Outcomes are integer percentages in `[0, 100]`: the share of the
//! requested credit amount a claim is worth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An outcome fraction in percent, always within `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutcomeFraction(u8);

impl OutcomeFraction {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Returns `None` above 100.
    pub fn new(percent: u8) -> Option<Self> {
        (percent <= 100).then_some(Self(percent))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Absolute distance between two outcomes, in percentage points.
    pub fn distance(&self, other: OutcomeFraction) -> u8 {
        self.0.abs_diff(other.0)
    }

    /// `amount × percent / 100`, rounded down. `None` on overflow.
    pub fn apply(&self, amount: u128) -> Option<u128> {
        amount.checked_mul(self.0 as u128).map(|v| v / 100)
    }
}

impl fmt::Display for OutcomeFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A vote on a claim, first-round or jury.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ballot {
    /// The evidence supports the full requested amount (scores 100).
    Approve,
    /// The evidence supports nothing (scores 0).
    Reject,
    /// Quantitative assessment in percent; must be within `[0, 100]`.
    Score(u8),
}

impl Ballot {
    /// The ballot's score, or `None` for an out-of-range `Score`.
    pub fn score(&self) -> Option<OutcomeFraction> {
        match self {
            Ballot::Approve => Some(OutcomeFraction::FULL),
            Ballot::Reject => Some(OutcomeFraction::ZERO),
            Ballot::Score(s) => OutcomeFraction::new(*s),
        }
    }
}

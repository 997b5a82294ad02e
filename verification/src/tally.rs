//! Reputation-weighted tallying.

use crate::error::VerificationError;
use serde::{Deserialize, Serialize};
use verity_types::{OutcomeFraction, BPS_DENOMINATOR};

/// How a strategy turns a weighted tally into a provisional outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TallyMode {
    /// All-or-nothing: 100 when weighted approval reaches the threshold,
    /// otherwise 0.
    #[default]
    Threshold,
    /// The floored weighted mean of the scores.
    Quantitative,
}

/// Running Σ(score·weight) and Σ(weight).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeightedTally {
    weighted_sum: u128,
    total_weight: u128,
}

impl WeightedTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, score: OutcomeFraction, weight: u64) -> Result<(), VerificationError> {
        let product = (score.percent() as u128)
            .checked_mul(weight as u128)
            .ok_or(VerificationError::Overflow)?;
        self.weighted_sum = self
            .weighted_sum
            .checked_add(product)
            .ok_or(VerificationError::Overflow)?;
        self.total_weight = self
            .total_weight
            .checked_add(weight as u128)
            .ok_or(VerificationError::Overflow)?;
        Ok(())
    }

    pub fn from_scores(
        scores: impl IntoIterator<Item = (OutcomeFraction, u64)>,
    ) -> Result<Self, VerificationError> {
        let mut tally = Self::new();
        for (score, weight) in scores {
            tally.add(score, weight)?;
        }
        Ok(tally)
    }

    pub fn total_weight(&self) -> u128 {
        self.total_weight
    }

    /// ⌊Σ(score·w) / Σw⌋.
    pub fn mean(&self) -> Result<OutcomeFraction, VerificationError> {
        if self.total_weight == 0 {
            return Err(VerificationError::ZeroTotalWeight);
        }
        let mean = self.weighted_sum / self.total_weight;
        // Every score is at most 100, so the mean is too.
        OutcomeFraction::new(mean as u8).ok_or(VerificationError::Overflow)
    }

    /// Weighted approval in basis points, floored.
    pub fn approval_bps(&self) -> Result<u32, VerificationError> {
        if self.total_weight == 0 {
            return Err(VerificationError::ZeroTotalWeight);
        }
        let scaled = self
            .weighted_sum
            .checked_mul(100)
            .ok_or(VerificationError::Overflow)?;
        Ok((scaled / self.total_weight).min(BPS_DENOMINATOR as u128) as u32)
    }

    pub fn outcome(
        &self,
        mode: TallyMode,
        approval_threshold_bps: u32,
    ) -> Result<OutcomeFraction, VerificationError> {
        match mode {
            TallyMode::Quantitative => self.mean(),
            TallyMode::Threshold => {
                if self.approval_bps()? >= approval_threshold_bps {
                    Ok(OutcomeFraction::FULL)
                } else {
                    Ok(OutcomeFraction::ZERO)
                }
            }
        }
    }
}

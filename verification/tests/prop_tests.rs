//! Property tests for the weighted tally.

use proptest::prelude::*;
use verity_types::OutcomeFraction;
use verity_verification::{TallyMode, WeightedTally};

fn votes() -> impl Strategy<Value = Vec<(u8, u64)>> {
    prop::collection::vec((0u8..=100, 1u64..1_000_000), 1..30)
}

proptest! {
    #[test]
    fn mean_is_floored_weighted_average(votes in votes()) {
        let tally = WeightedTally::from_scores(
            votes.iter().map(|(s, w)| (OutcomeFraction::new(*s).unwrap(), *w)),
        ).unwrap();
        let num: u128 = votes.iter().map(|(s, w)| *s as u128 * *w as u128).sum();
        let den: u128 = votes.iter().map(|(_, w)| *w as u128).sum();
        let mean = tally.mean().unwrap();
        prop_assert_eq!(mean.percent() as u128, num / den);
    }

    #[test]
    fn mean_is_bounded_by_extreme_scores(votes in votes()) {
        let tally = WeightedTally::from_scores(
            votes.iter().map(|(s, w)| (OutcomeFraction::new(*s).unwrap(), *w)),
        ).unwrap();
        let mean = tally.mean().unwrap().percent();
        let lo = votes.iter().map(|(s, _)| *s).min().unwrap();
        let hi = votes.iter().map(|(s, _)| *s).max().unwrap();
        prop_assert!(lo <= mean && mean <= hi);
    }

    #[test]
    fn threshold_outcome_is_all_or_nothing(votes in votes(), threshold in 0u32..=10_000) {
        let tally = WeightedTally::from_scores(
            votes.iter().map(|(s, w)| (OutcomeFraction::new(*s).unwrap(), *w)),
        ).unwrap();
        let outcome = tally.outcome(TallyMode::Threshold, threshold).unwrap();
        prop_assert!(outcome == OutcomeFraction::FULL || outcome == OutcomeFraction::ZERO);
        prop_assert_eq!(outcome == OutcomeFraction::FULL, tally.approval_bps().unwrap() >= threshold);
    }
}

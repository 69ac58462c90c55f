//! Gap detection over timestamp-ordered trades.
//!
//! Turns the trades already stored for a window into the list of
//! sub-ranges that still need fetching. A stretch between two stored
//! trades only counts as missing when the spacing exceeds the configured
//! tolerance, so quiet markets do not trigger endless refetching.
//!
//! # Emission order
//!
//! Gaps come out ascending by start: left cap, interior gaps, right cap.
//! Every emitted range is non-empty and lies inside the query window.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::trade::{TimeRange, Trade};
use crate::error::SyncError;

/// Default spacing tolerance: one hour.
pub const DEFAULT_TOLERANCE_MS: i64 = 60 * 60 * 1000;

/// How a window holding exactly one stored trade is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleRecordCaps {
    /// Only the distance to the window end is checked. When it exceeds the
    /// tolerance both sides of the trade are emitted, otherwise nothing is,
    /// however far the trade sits from the window start.
    #[default]
    Reference,
    /// Each side is checked independently, exactly like the end caps of the
    /// multi-trade case.
    Symmetric,
}

/// Parameters for gap detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapPolicy {
    tolerance_ms: i64,
    single_record_caps: SingleRecordCaps,
}

impl GapPolicy {
    /// Create a policy with the given tolerance.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidPolicy` if `tolerance_ms` is not positive.
    pub fn new(tolerance_ms: i64, single_record_caps: SingleRecordCaps) -> Result<Self, SyncError> {
        if tolerance_ms <= 0 {
            return Err(SyncError::InvalidPolicy(format!(
                "gap tolerance must be positive, got {tolerance_ms}ms"
            )));
        }
        Ok(Self {
            tolerance_ms,
            single_record_caps,
        })
    }

    /// Maximum allowed spacing between consecutive trades.
    #[must_use]
    pub const fn tolerance_ms(&self) -> i64 {
        self.tolerance_ms
    }

    /// Single-trade window handling.
    #[must_use]
    pub const fn single_record_caps(&self) -> SingleRecordCaps {
        self.single_record_caps
    }
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            tolerance_ms: DEFAULT_TOLERANCE_MS,
            single_record_caps: SingleRecordCaps::default(),
        }
    }
}

/// Compute the ranges of `window` not covered by `existing`.
///
/// `existing` must be sorted ascending by `mts` without duplicates.
#[must_use]
pub fn detect_gaps(existing: &[Trade], window: TimeRange, policy: &GapPolicy) -> Vec<TimeRange> {
    let timestamps: Vec<i64> = existing.iter().map(|t| t.mts).collect();
    detect_gaps_in_timestamps(&timestamps, window, policy)
}

/// Timestamp-only form of [`detect_gaps`].
#[must_use]
pub fn detect_gaps_in_timestamps(
    timestamps: &[i64],
    window: TimeRange,
    policy: &GapPolicy,
) -> Vec<TimeRange> {
    let gaps = match (timestamps, policy.single_record_caps) {
        ([], _) => vec![window],
        ([only], SingleRecordCaps::Reference) => single_record_gaps(*only, window, policy),
        _ => spaced_gaps(timestamps, window, policy),
    };

    for gap in &gaps {
        debug!(start = gap.start(), end = gap.end(), "Detected gap");
    }

    gaps
}

fn single_record_gaps(mts: i64, window: TimeRange, policy: &GapPolicy) -> Vec<TimeRange> {
    let far_from_end = mts < window.end() && window.end().saturating_sub(mts) > policy.tolerance_ms;
    if !far_from_end {
        return Vec::new();
    }

    [
        TimeRange::non_empty(window.start(), mts.saturating_sub(1)),
        TimeRange::non_empty(mts.saturating_add(1), window.end()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|gap| clamp(gap, window))
    .collect()
}

fn spaced_gaps(timestamps: &[i64], window: TimeRange, policy: &GapPolicy) -> Vec<TimeRange> {
    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return vec![window];
    };
    let tolerance = policy.tolerance_ms;
    let mut gaps = Vec::new();

    if first.saturating_sub(window.start()) > tolerance {
        gaps.extend(TimeRange::non_empty(window.start(), first.saturating_sub(1)));
    }

    for pair in timestamps.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.saturating_sub(prev) > tolerance {
            gaps.extend(
                TimeRange::non_empty(prev.saturating_add(1), next.saturating_sub(1))
                    .and_then(|gap| clamp(gap, window)),
            );
        }
    }

    if window.end().saturating_sub(last) > tolerance {
        gaps.extend(TimeRange::non_empty(last.saturating_add(1), window.end()));
    }

    gaps
}

/// Intersect `gap` with `window`, dropping it when nothing is left.
fn clamp(gap: TimeRange, window: TimeRange) -> Option<TimeRange> {
    TimeRange::non_empty(gap.start().max(window.start()), gap.end().min(window.end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    const T: i64 = DEFAULT_TOLERANCE_MS;

    fn window(start: i64, end: i64) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    fn policy(tolerance: i64) -> GapPolicy {
        GapPolicy::new(tolerance, SingleRecordCaps::Reference).unwrap()
    }

    fn symmetric(tolerance: i64) -> GapPolicy {
        GapPolicy::new(tolerance, SingleRecordCaps::Symmetric).unwrap()
    }

    fn bounds(gaps: &[TimeRange]) -> Vec<(i64, i64)> {
        gaps.iter().map(|g| (g.start(), g.end())).collect()
    }

    #[test]
    fn policy_rejects_non_positive_tolerance() {
        assert!(GapPolicy::new(0, SingleRecordCaps::Reference).is_err());
        assert!(GapPolicy::new(-5, SingleRecordCaps::Symmetric).is_err());
    }

    #[test]
    fn default_policy_is_one_hour_reference() {
        let policy = GapPolicy::default();
        assert_eq!(policy.tolerance_ms(), 3_600_000);
        assert_eq!(policy.single_record_caps(), SingleRecordCaps::Reference);
    }

    #[test]
    fn empty_store_is_one_gap() {
        let gaps = detect_gaps_in_timestamps(&[], window(100, 200), &policy(10));
        assert_eq!(bounds(&gaps), vec![(100, 200)]);
    }

    #[test]
    fn single_record_far_from_end_splits_window() {
        let gaps = detect_gaps_in_timestamps(&[150], window(100, 200), &policy(10));
        assert_eq!(bounds(&gaps), vec![(100, 149), (151, 200)]);
    }

    #[test]
    fn single_record_near_end_ignores_far_start() {
        // 195 is 95ms from the start but only 5ms from the end.
        let gaps = detect_gaps_in_timestamps(&[195], window(100, 200), &policy(10));
        assert!(gaps.is_empty());
    }

    #[test]
    fn single_record_near_start_still_emits_left_side() {
        let gaps = detect_gaps_in_timestamps(&[101], window(100, 200), &policy(10));
        assert_eq!(bounds(&gaps), vec![(100, 100), (102, 200)]);
    }

    #[test]
    fn single_record_at_window_start_drops_empty_left_side() {
        let gaps = detect_gaps_in_timestamps(&[100], window(100, 200), &policy(10));
        assert_eq!(bounds(&gaps), vec![(101, 200)]);
    }

    #[test]
    fn single_record_at_window_end_is_covered() {
        let gaps = detect_gaps_in_timestamps(&[200], window(100, 200), &policy(10));
        assert!(gaps.is_empty());
    }

    #[test]
    fn symmetric_single_record_checks_each_side() {
        let gaps = detect_gaps_in_timestamps(&[195], window(100, 200), &symmetric(10));
        assert_eq!(bounds(&gaps), vec![(100, 194)]);

        let gaps = detect_gaps_in_timestamps(&[105], window(100, 200), &symmetric(10));
        assert_eq!(bounds(&gaps), vec![(106, 200)]);

        let gaps = detect_gaps_in_timestamps(&[150], window(100, 200), &symmetric(10));
        assert_eq!(bounds(&gaps), vec![(100, 149), (151, 200)]);
    }

    #[test_case(T, &[] ; "exactly tolerance apart is covered")]
    #[test_case(T + 1, &[(1001, 1000 + T)] ; "one past tolerance is a zero width gap")]
    #[test_case(T + 2, &[(1001, 1001 + T)] ; "two past tolerance")]
    fn threshold_boundary(spacing: i64, expected: &[(i64, i64)]) {
        let a = 1000;
        let b = a + spacing;
        let gaps = detect_gaps_in_timestamps(&[a, b], window(a, b), &policy(T));
        assert_eq!(bounds(&gaps), expected.to_vec());
    }

    #[test]
    fn interior_gap_excludes_both_neighbours() {
        let gaps = detect_gaps_in_timestamps(&[0, 11], window(0, 11), &policy(10));
        assert_eq!(bounds(&gaps), vec![(1, 10)]);
    }

    #[test]
    fn two_records_interior_gap_and_right_cap() {
        let tolerance = 100;
        let second = 100 + tolerance + 5;
        let gaps = detect_gaps_in_timestamps(&[100, second], window(0, 1000), &policy(tolerance));

        // 1000 - 205 > 100, so the right cap is present; 100 - 0 is not > 100.
        assert_eq!(bounds(&gaps), vec![(101, second - 1), (second + 1, 1000)]);
    }

    #[test]
    fn far_first_record_yields_left_cap() {
        let gaps = detect_gaps_in_timestamps(&[500, 510, 520], window(0, 530), &policy(100));
        assert_eq!(bounds(&gaps), vec![(0, 499)]);
    }

    #[test]
    fn all_interior_pairs_are_scanned() {
        let gaps = detect_gaps_in_timestamps(
            &[0, 50, 300, 310, 700],
            window(0, 700),
            &policy(100),
        );
        assert_eq!(bounds(&gaps), vec![(51, 299), (311, 699)]);
    }

    #[test]
    fn dense_records_have_no_gaps() {
        let timestamps: Vec<i64> = (0..=100).map(|i| i * 10).collect();
        let gaps = detect_gaps_in_timestamps(&timestamps, window(0, 1000), &policy(10));
        assert!(gaps.is_empty());
    }

    #[test]
    fn detect_gaps_reads_trade_timestamps() {
        use rust_decimal::Decimal;

        let trade = |mts| Trade {
            id: mts,
            mts,
            amount: Decimal::ONE,
            price: Decimal::ONE,
            exchange: "bitfinex".to_string(),
            symbol: "tBTCUSD".to_string(),
        };
        let gaps = detect_gaps(&[trade(150)], window(100, 200), &policy(10));
        assert_eq!(bounds(&gaps), vec![(100, 149), (151, 200)]);
    }

    fn sorted_unique(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
        prop::collection::btree_set(0i64..10_000, 0..max_len)
            .prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #[test]
        fn gaps_are_sorted_disjoint_and_inside_window(
            timestamps in sorted_unique(40),
            tolerance in 1i64..500,
            symmetric_caps in any::<bool>(),
        ) {
            let caps = if symmetric_caps { SingleRecordCaps::Symmetric } else { SingleRecordCaps::Reference };
            let policy = GapPolicy::new(tolerance, caps).unwrap();
            let window = window(0, 10_000);

            let gaps = detect_gaps_in_timestamps(&timestamps, window, &policy);

            for gap in &gaps {
                prop_assert!(gap.start() <= gap.end());
                prop_assert!(window.encloses(gap));
            }
            for pair in gaps.windows(2) {
                prop_assert!(pair[0].end() < pair[1].start());
            }
        }

        #[test]
        fn gaps_never_cover_stored_records(
            timestamps in sorted_unique(40),
            tolerance in 1i64..500,
        ) {
            let gaps = detect_gaps_in_timestamps(&timestamps, window(0, 10_000), &policy(tolerance));
            for mts in &timestamps {
                prop_assert!(gaps.iter().all(|g| !g.contains(*mts)));
            }
        }
    }
}

use crate::{
    boundary::{Boundary, OrderingMode, RowPosition},
    gap::{EvictionPolicy, GapSet, Interval, MergeOptions, WidthMetric},
    obs::{MetricsEvent, MetricsSink, with_metrics_sink},
    test_support::{at, ids, row},
};
use proptest::prelude::*;
use std::cell::RefCell;

// ---- helpers -----------------------------------------------------------

const MODES: [OrderingMode; 2] = [OrderingMode::Literal, OrderingMode::Lexicographic];

fn set(intervals: Vec<Interval>) -> GapSet {
    GapSet::from_intervals("common", intervals)
}

fn gap(from: Boundary, to: Boundary) -> Interval {
    Interval::new(from, to)
}

fn options(limit: usize, ordering: OrderingMode) -> MergeOptions {
    MergeOptions::new(limit).with_ordering(ordering)
}

// ---- bootstrap ---------------------------------------------------------

#[test]
fn bootstrap_brackets_the_first_window() {
    let low = RowPosition::new(1, 100.0, 100);
    let high = RowPosition::new(5, 104.0, 104);

    for mode in MODES {
        let merged = GapSet::new("common").merge(low, high, &options(0, mode));

        assert_eq!(
            merged.intervals(),
            &[
                gap(Boundary::LowSentinel, Boundary::Interior(low)),
                gap(Boundary::Interior(high), Boundary::HighSentinel),
            ]
        );
        assert_eq!(merged.category(), "common");
    }
}

#[test]
fn bootstrap_ignores_limit() {
    let merged = GapSet::new("common").merge(row(1), row(5), &MergeOptions::new(1));

    assert_eq!(merged.len(), 2);
}

// ---- steady state ------------------------------------------------------

#[test]
fn window_above_previous_high_opens_a_middle_gap() {
    let previous = set(vec![
        gap(Boundary::LowSentinel, at(11)),
        gap(at(20), Boundary::HighSentinel),
    ]);

    for mode in MODES {
        let merged = previous.merge(row(31), row(40), &options(0, mode));

        assert_eq!(
            ids(merged.intervals()),
            vec![(None, Some(11)), (Some(20), Some(31)), (Some(40), None)]
        );
    }
}

#[test]
fn window_below_previous_low_splits_the_open_low_gap() {
    let previous = set(vec![
        gap(Boundary::LowSentinel, at(11)),
        gap(at(20), Boundary::HighSentinel),
    ]);

    for mode in MODES {
        let merged = previous.merge(row(1), row(10), &options(0, mode));

        assert_eq!(
            ids(merged.intervals()),
            vec![(None, Some(1)), (Some(10), Some(11)), (Some(20), None)]
        );
    }
}

#[test]
fn window_inside_an_interior_gap_clips_both_sides() {
    let previous = set(vec![
        gap(Boundary::LowSentinel, at(5)),
        gap(at(10), at(30)),
        gap(at(40), Boundary::HighSentinel),
    ]);

    let merged = previous.merge(row(15), row(20), &options(0, OrderingMode::Lexicographic));

    assert_eq!(
        ids(merged.intervals()),
        vec![
            (None, Some(5)),
            (Some(10), Some(15)),
            (Some(20), Some(30)),
            (Some(40), None),
        ]
    );
}

#[test]
fn window_spanning_whole_gaps_drops_them() {
    let previous = set(vec![
        gap(Boundary::LowSentinel, at(5)),
        gap(at(10), at(12)),
        gap(at(14), at(16)),
        gap(at(40), Boundary::HighSentinel),
    ]);

    let merged = previous.merge(row(8), row(20), &options(0, OrderingMode::Lexicographic));

    assert_eq!(
        ids(merged.intervals()),
        vec![(None, Some(5)), (Some(40), None)]
    );
}

#[test]
fn merge_leaves_the_previous_set_untouched() {
    let previous = set(vec![
        gap(Boundary::LowSentinel, at(11)),
        gap(at(20), Boundary::HighSentinel),
    ]);
    let snapshot = previous.clone();

    let merged = previous.merge(row(31), row(40), &MergeOptions::default());

    assert_eq!(previous, snapshot);
    assert_ne!(merged, previous);
}

#[test]
fn merge_keeps_the_category() {
    let previous = GapSet::from_intervals("sports", vec![gap(Boundary::LowSentinel, at(3))]);

    let merged = previous.merge(row(5), row(6), &MergeOptions::default());

    assert_eq!(merged.category(), "sports");
}

#[test]
fn refetching_the_same_window_is_idempotent() {
    for mode in MODES {
        let opts = options(0, mode);
        let once = GapSet::new("common").merge(row(10), row(19), &opts);
        let twice = once.merge(row(10), row(19), &opts);
        let thrice = twice.merge(row(10), row(19), &opts);

        assert_eq!(once, twice);
        assert_eq!(twice, thrice);
    }
}

#[test]
fn literal_mode_emits_a_degenerate_gap_when_a_window_starts_on_a_gap_edge() {
    let previous = set(vec![
        gap(Boundary::LowSentinel, at(10)),
        gap(at(20), Boundary::HighSentinel),
    ]);

    let literal = previous.merge(row(20), row(25), &options(0, OrderingMode::Literal));
    assert_eq!(
        ids(literal.intervals()),
        vec![(None, Some(10)), (Some(20), Some(20)), (Some(25), None)]
    );
    assert!(literal.validate(OrderingMode::Lexicographic).is_err());

    let corrected = previous.merge(row(20), row(25), &options(0, OrderingMode::Lexicographic));
    assert_eq!(
        ids(corrected.intervals()),
        vec![(None, Some(10)), (Some(25), None)]
    );
    assert!(corrected.validate(OrderingMode::Lexicographic).is_ok());
}

// ---- eviction ----------------------------------------------------------

// six gaps after merging [60, 70]: two of them one id wide
fn crowded() -> GapSet {
    set(vec![
        gap(Boundary::LowSentinel, at(1)),
        gap(at(5), at(6)),
        gap(at(10), at(30)),
        gap(at(40), at(41)),
        gap(at(50), Boundary::HighSentinel),
    ])
}

#[test]
fn eviction_prefers_narrow_gaps_before_truncating() {
    let merged = crowded().merge(row(60), row(70), &MergeOptions::new(4));

    assert_eq!(
        ids(merged.intervals()),
        vec![
            (None, Some(1)),
            (Some(10), Some(30)),
            (Some(50), Some(60)),
            (Some(70), None),
        ]
    );
}

#[test]
fn eviction_truncates_the_oldest_and_reopens_the_low_end() {
    let merged = crowded().merge(row(60), row(70), &MergeOptions::new(2));

    assert_eq!(ids(merged.intervals()), vec![(None, Some(60)), (Some(70), None)]);
    assert!(merged.intervals()[0].from.is_low_sentinel());
}

#[test]
fn eviction_reopens_the_low_end_even_without_truncation() {
    let previous = set(vec![
        gap(at(5), at(6)),
        gap(at(10), at(30)),
        gap(at(50), Boundary::HighSentinel),
    ]);

    let merged = previous.merge(row(60), row(70), &MergeOptions::new(3));

    assert_eq!(
        ids(merged.intervals()),
        vec![(None, Some(30)), (Some(50), Some(60)), (Some(70), None)]
    );
}

#[test]
fn zero_limit_never_evicts() {
    let merged = crowded().merge(row(60), row(70), &MergeOptions::new(0));

    assert_eq!(merged.len(), 6);
    assert_eq!(merged.intervals()[1].from.resource_id(), Some(5));
}

#[test]
fn sentinel_ended_gaps_are_never_narrow_under_the_id_proxy() {
    let policy = EvictionPolicy::default();

    assert!(!policy.is_narrow(&gap(Boundary::LowSentinel, at(1))));
    assert!(!policy.is_narrow(&gap(at(1), Boundary::HighSentinel)));
    assert!(policy.is_narrow(&gap(at(1), at(10))));
    assert!(!policy.is_narrow(&gap(at(1), at(11))));
}

#[test]
fn weight_metric_sees_what_the_id_proxy_misses() {
    let wide_by_weight = gap(
        Boundary::interior(5, 100.0, 1),
        Boundary::interior(6, 900.0, 2),
    );

    assert!(EvictionPolicy::new(10.0, WidthMetric::ResourceIdProxy).is_narrow(&wide_by_weight));
    assert!(!EvictionPolicy::new(10.0, WidthMetric::Weight).is_narrow(&wide_by_weight));
    assert!(!EvictionPolicy::new(10.0, WidthMetric::Weight)
        .is_narrow(&gap(at(3), Boundary::HighSentinel)));
}

#[test]
fn eviction_reports_through_the_metrics_sink() {
    #[derive(Default)]
    struct Capture(RefCell<Vec<(usize, usize)>>);

    impl MetricsSink for Capture {
        fn record(&self, event: MetricsEvent<'_>) {
            if let MetricsEvent::Eviction {
                narrow_dropped,
                truncated,
                ..
            } = event
            {
                self.0.borrow_mut().push((narrow_dropped, truncated));
            }
        }
    }

    let sink = Capture::default();
    with_metrics_sink(&sink, || {
        let _ = crowded().merge(row(60), row(70), &MergeOptions::new(2));
        let _ = crowded().merge(row(60), row(70), &MergeOptions::new(0));
    });

    assert_eq!(sink.0.into_inner(), vec![(2, 2)]);
}

// ---- checked merge and validation -------------------------------------

#[test]
fn try_merge_rejects_an_inverted_window() {
    let opts = options(0, OrderingMode::Lexicographic);
    let err = GapSet::new("common")
        .try_merge(row(9), row(3), &opts)
        .expect_err("inverted window should be rejected");

    assert!(err.is_invariant_violation());
}

#[test]
fn try_merge_rejects_an_overlapping_input_set() {
    let overlapping = set(vec![gap(Boundary::LowSentinel, at(20)), gap(at(10), at(30))]);

    let err = overlapping
        .try_merge(row(40), row(50), &options(0, OrderingMode::Lexicographic))
        .expect_err("overlapping input should be rejected");

    assert!(err.message.contains("overlaps"));
}

#[test]
fn try_merge_matches_merge_on_valid_input() {
    let opts = options(0, OrderingMode::Lexicographic);
    let previous = GapSet::new("common").merge(row(10), row(20), &opts);

    let checked = previous
        .try_merge(row(30), row(40), &opts)
        .expect("valid merge should succeed");

    assert_eq!(checked, previous.merge(row(30), row(40), &opts));
}

#[test]
fn validate_rejects_empty_gaps() {
    let degenerate = set(vec![gap(at(4), at(4))]);

    assert!(degenerate.validate(OrderingMode::Lexicographic).is_err());
    assert!(set(Vec::new()).validate(OrderingMode::Lexicographic).is_ok());
}

#[test]
fn contains_is_exclusive_at_both_ends() {
    let gaps = set(vec![gap(at(10), at(20))]);
    let mode = OrderingMode::Lexicographic;

    assert!(gaps.contains(&at(15), mode));
    assert!(!gaps.contains(&at(10), mode));
    assert!(!gaps.contains(&at(20), mode));
}

// ---- presentation and storage -----------------------------------------

#[test]
fn display_lists_one_gap_per_line() {
    let gaps = GapSet::from_intervals(
        "common",
        vec![gap(Boundary::LowSentinel, Boundary::interior(1, 100.0, 100))],
    );

    assert_eq!(gaps.to_string(), "common {\n  [-inf, (1, 100, 100)]\n}");
}

#[test]
fn gap_set_survives_a_json_round_trip() {
    let gaps = GapSet::new("common").merge(row(1), row(5), &MergeOptions::default());

    let json = serde_json::to_string(&gaps).expect("serialize gap set");
    let back: GapSet = serde_json::from_str(&json).expect("deserialize gap set");

    assert_eq!(back, gaps);
    assert_eq!(back.category(), "common");
}

// ---- properties --------------------------------------------------------

const PROBE_MAX: i64 = 200;

fn arb_windows() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0..PROBE_MAX, 0..PROBE_MAX), 1..24).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect()
    })
}

fn covered_probes(gaps: &GapSet, mode: OrderingMode) -> Vec<i64> {
    (-1..=PROBE_MAX + 1)
        .filter(|id| gaps.contains(&at(*id), mode))
        .collect()
}

proptest! {
    #[test]
    fn merges_only_ever_shrink_coverage(windows in arb_windows()) {
        let mode = OrderingMode::Lexicographic;
        let opts = options(0, mode);
        let mut gaps = GapSet::new("common");

        for (low, high) in windows {
            let next = gaps.merge(row(low), row(high), &opts);
            prop_assert!(next.validate(mode).is_ok(), "invalid layout: {}", next);

            let after = covered_probes(&next, mode);
            for id in (low + 1)..high {
                prop_assert!(!after.contains(&id), "fetched id {} still in a gap", id);
            }
            if !gaps.is_empty() {
                let before = covered_probes(&gaps, mode);
                prop_assert!(after.iter().all(|id| before.contains(id)));
                prop_assert!(after.len() <= before.len());
            }

            gaps = next;
        }
    }

    #[test]
    fn eviction_caps_size_and_keeps_the_low_end_open(
        windows in arb_windows(),
        limit in 1usize..6,
    ) {
        for mode in MODES {
            let opts = options(limit, mode);
            let mut gaps = GapSet::new("common");

            for &(low, high) in &windows {
                gaps = gaps.merge(row(low), row(high), &opts);

                prop_assert!(gaps.len() <= limit.max(2));
                if let Some(first) = gaps.first() {
                    prop_assert!(first.from.is_low_sentinel());
                }
            }
        }
    }

    #[test]
    fn repeated_window_is_a_fixed_point(windows in arb_windows()) {
        let opts = options(0, OrderingMode::Lexicographic);
        let mut gaps = GapSet::new("common");

        for (low, high) in windows {
            gaps = gaps.merge(row(low), row(high), &opts);
            let again = gaps.merge(row(low), row(high), &opts);
            prop_assert_eq!(&again, &gaps);
        }
    }
}

//! Property tests: ordering, completeness and determinism of the merge.

use dpm_merge::{MergeEngine, PatientGroup};
use proptest::prelude::*;

/// `(patient, time, (stream, position))`
type Event = (u8, u16, (usize, usize));

fn sorted_streams() -> impl Strategy<Value = Vec<Vec<Event>>> {
    prop::collection::vec(
        prop::collection::vec((0u8..6, 0u16..20), 0..12),
        1..6,
    )
    .prop_map(|streams| {
        streams
            .into_iter()
            .enumerate()
            .map(|(stream, mut rows)| {
                rows.sort_unstable();
                rows.into_iter()
                    .enumerate()
                    .map(|(position, (key, time))| (key, time, (stream, position)))
                    .collect()
            })
            .collect()
    })
}

fn merge(streams: Vec<Vec<Event>>) -> Vec<PatientGroup<Event>> {
    MergeEngine::new(streams)
        .expect("engine")
        .collect::<Result<Vec<_>, _>>()
        .expect("merge")
}

proptest! {
    #[test]
    fn output_is_globally_sorted(streams in sorted_streams()) {
        let groups = merge(streams);
        let flat: Vec<(u8, u16)> = groups
            .iter()
            .flat_map(PatientGroup::iter_events)
            .map(|e| (e.0, e.1))
            .collect();
        prop_assert!(flat.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn every_event_lands_in_exactly_one_group(streams in sorted_streams()) {
        let mut expected: Vec<Event> = streams.iter().flatten().copied().collect();
        let groups = merge(streams);

        let mut seen: Vec<Event> = groups.iter().flat_map(PatientGroup::iter_events).copied().collect();
        expected.sort_unstable();
        seen.sort_unstable();
        prop_assert_eq!(seen, expected);

        for group in &groups {
            prop_assert!(!group.is_empty());
            prop_assert!(group.iter_events().all(|e| e.0 == group.key));
        }
        // Keys strictly increase across groups, so no key is split.
        prop_assert!(groups.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn ties_resolve_by_stream_index(streams in sorted_streams()) {
        let groups = merge(streams);
        for group in &groups {
            for pair in group.events.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if (a.event.0, a.event.1) == (b.event.0, b.event.1) {
                    prop_assert!(a.stream <= b.stream);
                }
                prop_assert_eq!(a.stream, a.event.2.0);
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical(streams in sorted_streams()) {
        let first = merge(streams.clone());
        let second = merge(streams);
        prop_assert_eq!(first, second);
    }
}

//! Ordering keys of mergeable events.

use std::fmt::Debug;

use dpm_model::{ClinicalEvent, PatientKey, Timestamp};

/// An event that can take part in a merge by `(key, time)`.
///
/// Keys are totally ordered. Timestamps only need `PartialOrd`; a timestamp
/// that does not compare equal to itself (a NaN, say) is rejected as a
/// malformed event when it reaches the head of its stream.
pub trait MergeRecord {
    type Key: Ord + Clone + Debug;
    type Time: PartialOrd + Debug;

    fn key(&self) -> &Self::Key;
    fn time(&self) -> &Self::Time;
}

impl MergeRecord for ClinicalEvent {
    type Key = PatientKey;
    type Time = Timestamp;

    fn key(&self) -> &PatientKey {
        &self.patient
    }

    fn time(&self) -> &Timestamp {
        &self.time
    }
}

impl<K, T> MergeRecord for (K, T)
where
    K: Ord + Clone + Debug,
    T: PartialOrd + Debug,
{
    type Key = K;
    type Time = T;

    fn key(&self) -> &K {
        &self.0
    }

    fn time(&self) -> &T {
        &self.1
    }
}

impl<K, T, P> MergeRecord for (K, T, P)
where
    K: Ord + Clone + Debug,
    T: PartialOrd + Debug,
{
    type Key = K;
    type Time = T;

    fn key(&self) -> &K {
        &self.0
    }

    fn time(&self) -> &T {
        &self.1
    }
}

/// Returns a description of why `record` cannot be ordered, if it cannot.
pub(crate) fn check_orderable<E: MergeRecord>(record: &E) -> Option<String> {
    let time = record.time();
    if time.partial_cmp(time).is_none() {
        return Some(format!("timestamp {time:?} is not comparable"));
    }
    None
}
